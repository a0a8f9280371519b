use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    Name,
    Phone,
    TicketType,
    Price,
    Status,
    Date,
    QrCode,
    CheckedIn,
    CheckInTime,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ticket_type / status are stored as plain strings so the same schema
        // runs on SQLite and PostgreSQL
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Tickets::Phone).text().null())
                    .col(ColumnDef::new(Tickets::TicketType).string_len(16).not_null())
                    .col(ColumnDef::new(Tickets::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(Tickets::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Tickets::Date).date().not_null())
                    .col(ColumnDef::new(Tickets::QrCode).text().null())
                    .col(
                        ColumnDef::new(Tickets::CheckedIn)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Tickets::CheckInTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_status")
                    .table(Tickets::Table)
                    .col(Tickets::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Tickets::Table).to_owned())
            .await
    }
}
