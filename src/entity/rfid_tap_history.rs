use sea_orm::entity::prelude::*;

/// Append-only. Rows are inserted, never updated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rfid_tap_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rfid_card_id: Uuid,
    pub card_uid: String,
    pub custom_uid: String,
    pub tap_number: i32,
    pub tapped_at: DateTimeWithTimeZone,
    pub device_info: Option<String>,
    pub wifi_network: Option<String>,
    pub signal_strength: Option<i32>,
    pub validation_status: Option<String>,
    pub readable_time: Option<String>,
    pub timestamp_value: Option<i64>,
    pub rfid_scanner_status: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rfid_cards::Entity",
        from = "Column::RfidCardId",
        to = "super::rfid_cards::Column::Id"
    )]
    RfidCards,
}

impl Related<super::rfid_cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RfidCards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
