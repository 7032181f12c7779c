use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub pet_id: Uuid,
    pub rfid_card_id: Option<Uuid>,
    pub custom_rfid: Option<String>,
    pub status: String,
    pub total_amount: i64,
    pub estimated_completion: Option<DateTimeWithTimeZone>,
    #[sea_orm(unique)]
    pub tracking_token: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pets::Entity",
        from = "Column::PetId",
        to = "super::pets::Column::Id"
    )]
    Pets,
    #[sea_orm(
        belongs_to = "super::rfid_cards::Entity",
        from = "Column::RfidCardId",
        to = "super::rfid_cards::Column::Id"
    )]
    RfidCards,
    #[sea_orm(has_many = "super::booking_services::Entity")]
    BookingServices,
    #[sea_orm(has_many = "super::status_updates::Entity")]
    StatusUpdates,
}

impl Related<super::pets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pets.def()
    }
}

impl Related<super::rfid_cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RfidCards.def()
    }
}

impl Related<super::booking_services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookingServices.def()
    }
}

impl Related<super::status_updates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusUpdates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
