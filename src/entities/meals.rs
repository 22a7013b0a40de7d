use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "meals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub daily_log_id: Uuid,

    pub meal_type: String,

    pub food_name: String,

    pub serving_size: String,

    pub calories: Option<i32>,

    pub protein: Option<f32>,

    pub carbs: Option<f32>,

    pub fats: Option<f32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::daily_logs::Entity",
        from = "Column::DailyLogId",
        to = "super::daily_logs::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    DailyLogs,
}

impl Related<super::daily_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
