// File: nuqta-core/src/repositories/postgres/customers.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::customer::GlobalCustomer;
use nuqta_common::traits::repository_traits::CustomerRepository;

pub struct PostgresCustomerRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresCustomerRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn create(&self, customer: &GlobalCustomer) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO global_customers (
                customer_id,
                full_name,
                phone_number,
                email,
                phone_verified,
                email_verified,
                language,
                created_at,
                updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            "#,
        )
            .bind(customer.customer_id)
            .bind(&customer.full_name)
            .bind(&customer.phone_number)
            .bind(&customer.email)
            .bind(customer.phone_verified)
            .bind(customer.email_verified)
            .bind(&customer.language)
            .bind(customer.created_at)
            .bind(customer.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, customer_id: Uuid) -> Result<Option<GlobalCustomer>, Error> {
        let row = sqlx::query_as::<_, GlobalCustomer>(
            r#"
            SELECT customer_id, full_name, phone_number, email,
                   phone_verified, email_verified, language,
                   created_at, updated_at
            FROM global_customers
            WHERE customer_id = $1
            "#,
        )
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_phone(&self, phone: &str) -> Result<Option<GlobalCustomer>, Error> {
        let row = sqlx::query_as::<_, GlobalCustomer>(
            r#"
            SELECT customer_id, full_name, phone_number, email,
                   phone_verified, email_verified, language,
                   created_at, updated_at
            FROM global_customers
            WHERE phone_number = $1
            "#,
        )
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
