use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_addresses_table::Migration),
            Box::new(m20250601_000002_create_customers_table::Migration),
            Box::new(m20250601_000003_create_customer_addresses_table::Migration),
            Box::new(m20250601_000004_create_suppliers_table::Migration),
            Box::new(m20250601_000005_create_products_table::Migration),
            Box::new(m20250601_000006_create_orders_table::Migration),
            Box::new(m20250601_000007_create_order_items_table::Migration),
            Box::new(m20250601_000008_create_order_payment_methods_table::Migration),
            Box::new(m20250601_000009_create_receivables_table::Migration),
        ]
    }
}

mod m20250601_000001_create_addresses_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000001_create_addresses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Addresses::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Addresses::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Addresses::PostalCode).string_len(8).not_null())
                        .col(ColumnDef::new(Addresses::Street).string().not_null())
                        .col(ColumnDef::new(Addresses::Number).string_len(20).not_null())
                        .col(ColumnDef::new(Addresses::Complement).string_len(100).null())
                        .col(ColumnDef::new(Addresses::Neighborhood).string_len(50).not_null())
                        .col(ColumnDef::new(Addresses::City).string_len(50).not_null())
                        .col(ColumnDef::new(Addresses::State).string_len(2).not_null())
                        .col(ColumnDef::new(Addresses::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            // Dedup lookups hit all content fields; the postal code leads.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_addresses_postal_code")
                        .table(Addresses::Table)
                        .col(Addresses::PostalCode)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Addresses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Addresses {
        Table,
        Id,
        PostalCode,
        Street,
        Number,
        Complement,
        Neighborhood,
        City,
        State,
        CreatedAt,
    }
}

mod m20250601_000002_create_customers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000002_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Customers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Customers::Name).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Customers::TaxId)
                                .string_len(11)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Customers::Email)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::Phone).string_len(11).null())
                        .col(ColumnDef::new(Customers::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Customers::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        Name,
        TaxId,
        Email,
        Phone,
        PasswordHash,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250601_000003_create_customer_addresses_table {
    use super::m20250601_000001_create_addresses_table::Addresses;
    use super::m20250601_000002_create_customers_table::Customers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000003_create_customer_addresses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CustomerAddresses::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(CustomerAddresses::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(CustomerAddresses::AddressId).uuid().not_null())
                        .primary_key(
                            Index::create()
                                .col(CustomerAddresses::CustomerId)
                                .col(CustomerAddresses::AddressId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customer_addresses_customer_id")
                                .from(CustomerAddresses::Table, CustomerAddresses::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customer_addresses_address_id")
                                .from(CustomerAddresses::Table, CustomerAddresses::AddressId)
                                .to(Addresses::Table, Addresses::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customer_addresses_address_id")
                        .table(CustomerAddresses::Table)
                        .col(CustomerAddresses::AddressId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CustomerAddresses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CustomerAddresses {
        Table,
        CustomerId,
        AddressId,
    }
}

mod m20250601_000004_create_suppliers_table {
    use super::m20250601_000001_create_addresses_table::Addresses;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000004_create_suppliers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Suppliers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Suppliers::LegalName).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Suppliers::TaxId)
                                .string_len(14)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::Email)
                                .string_len(100)
                                .null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Phone).string_len(11).null())
                        .col(ColumnDef::new(Suppliers::AddressId).uuid().not_null())
                        .col(ColumnDef::new(Suppliers::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Suppliers::UpdatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_suppliers_address_id")
                                .from(Suppliers::Table, Suppliers::AddressId)
                                .to(Addresses::Table, Addresses::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        Id,
        LegalName,
        TaxId,
        Email,
        Phone,
        AddressId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250601_000005_create_products_table {
    use super::m20250601_000004_create_suppliers_table::Suppliers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000005_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Description).string().not_null())
                        .col(
                            ColumnDef::new(Products::Barcode)
                                .string_len(14)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::PurchasePrice).decimal().not_null())
                        .col(ColumnDef::new(Products::SalePrice).decimal().not_null())
                        .col(ColumnDef::new(Products::Stock).integer().not_null().default(0))
                        .col(ColumnDef::new(Products::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_supplier_id")
                                .from(Products::Table, Products::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_supplier_id")
                        .table(Products::Table)
                        .col(Products::SupplierId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Sku,
        Description,
        Barcode,
        PurchasePrice,
        SalePrice,
        Stock,
        SupplierId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250601_000006_create_orders_table {
    use super::m20250601_000001_create_addresses_table::Addresses;
    use super::m20250601_000002_create_customers_table::Customers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000006_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string_len(30)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::DeliveryAddressId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string_len(30).not_null())
                        .col(ColumnDef::new(Orders::Total).decimal().not_null().default(0))
                        .col(
                            ColumnDef::new(Orders::Installments)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_customer_id")
                                .from(Orders::Table, Orders::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_delivery_address_id")
                                .from(Orders::Table, Orders::DeliveryAddressId)
                                .to(Addresses::Table, Addresses::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_customer_id")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        DeliveryAddressId,
        Status,
        Total,
        Installments,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250601_000007_create_order_items_table {
    use super::m20250601_000005_create_products_table::Products;
    use super::m20250601_000006_create_orders_table::Orders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000007_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(OrderItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(OrderItems::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(OrderItems::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_product_id")
                                .from(OrderItems::Table, OrderItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        Quantity,
        UnitPrice,
        CreatedAt,
    }
}

mod m20250601_000008_create_order_payment_methods_table {
    use super::m20250601_000006_create_orders_table::Orders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000008_create_order_payment_methods_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderPaymentMethods::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(OrderPaymentMethods::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderPaymentMethods::PaymentMethod)
                                .string_len(30)
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(OrderPaymentMethods::OrderId)
                                .col(OrderPaymentMethods::PaymentMethod),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_payment_methods_order_id")
                                .from(OrderPaymentMethods::Table, OrderPaymentMethods::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderPaymentMethods::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum OrderPaymentMethods {
        Table,
        OrderId,
        PaymentMethod,
    }
}

mod m20250601_000009_create_receivables_table {
    use super::m20250601_000006_create_orders_table::Orders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000009_create_receivables_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Receivables::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Receivables::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Receivables::OrderId).uuid().not_null())
                        .col(ColumnDef::new(Receivables::Installment).integer().not_null())
                        .col(ColumnDef::new(Receivables::DueDate).date().not_null())
                        .col(ColumnDef::new(Receivables::Amount).decimal().not_null())
                        .col(ColumnDef::new(Receivables::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_receivables_order_id")
                                .from(Receivables::Table, Receivables::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_receivables_order_id")
                        .table(Receivables::Table)
                        .col(Receivables::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Receivables::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Receivables {
        Table,
        Id,
        OrderId,
        Installment,
        DueDate,
        Amount,
        CreatedAt,
    }
}
