use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rfid_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub card_uid: String,
    pub custom_uid: String,
    pub tap_count: i32,
    pub max_taps: i32,
    pub status: String,
    pub device_source: Option<String>,
    pub last_sync_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rfid_tap_history::Entity")]
    TapHistory,
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::rfid_tap_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TapHistory.def()
    }
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
