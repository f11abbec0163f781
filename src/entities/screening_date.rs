use sea_orm::entity::prelude::*;

/// One concrete showing. `date` is `YYYY-MM-DD`, `time` is `HH:MM`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "screening_dates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub screening_id: i32,
    pub date: String,
    pub time: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::screening::Entity",
        from = "Column::ScreeningId",
        to = "super::screening::Column::Id",
        on_delete = "Cascade"
    )]
    Screening,
}

impl Related<super::screening::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Screening.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
