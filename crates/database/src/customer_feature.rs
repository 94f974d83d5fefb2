//! Repository functions for the feature mart table.

use churn_structs::FeatureRecord;
use sqlx::PgPool;

/// Lists the feature table's column names, lower-cased, in table order.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn fetch_feature_columns(pool: &PgPool, table: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r"
        SELECT lower(column_name::text)
        FROM information_schema.columns
        WHERE table_schema = current_schema() AND table_name = $1
        ORDER BY ordinal_position
        ",
    )
    .bind(table)
    .fetch_all(pool)
    .await
}

/// Fetches every feature row ordered by customer id, then load order.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn fetch_features(pool: &PgPool) -> Result<Vec<FeatureRecord>, sqlx::Error> {
    sqlx::query_as::<_, FeatureRecord>(
        r"
        SELECT customer_id, gender, senior_citizen, has_partner, has_dependents,
               tenure_months, contract_type, internet_service, payment_method,
               paperless_billing, monthly_charges, total_charges, is_new_customer,
               is_month_to_month, is_high_monthly_charges, churn_label
        FROM customer_churn_features
        ORDER BY customer_id, row_ordinal
        ",
    )
    .fetch_all(pool)
    .await
}

/// Replaces the feature table contents in one transaction.
///
/// Rows are inserted in slice order so `row_ordinal` records load order.
///
/// # Errors
///
/// Returns an error if the database operation fails; the previous contents
/// are kept in that case.
pub async fn replace_features(pool: &PgPool, records: &[FeatureRecord]) -> Result<u64, sqlx::Error> {
    let customer_ids: Vec<String> = records.iter().map(|r| r.customer_id.clone()).collect();
    let genders: Vec<Option<String>> = records.iter().map(|r| r.gender.clone()).collect();
    let senior_citizens: Vec<i32> = records.iter().map(|r| r.senior_citizen).collect();
    let partners: Vec<bool> = records.iter().map(|r| r.has_partner).collect();
    let dependents: Vec<bool> = records.iter().map(|r| r.has_dependents).collect();
    let tenures: Vec<i32> = records.iter().map(|r| r.tenure_months).collect();
    let contracts: Vec<Option<String>> = records.iter().map(|r| r.contract_type.clone()).collect();
    let internet: Vec<Option<String>> = records.iter().map(|r| r.internet_service.clone()).collect();
    let payments: Vec<Option<String>> = records.iter().map(|r| r.payment_method.clone()).collect();
    let paperless: Vec<bool> = records.iter().map(|r| r.paperless_billing).collect();
    let monthly: Vec<f64> = records.iter().map(|r| r.monthly_charges).collect();
    let totals: Vec<Option<f64>> = records.iter().map(|r| r.total_charges).collect();
    let new_customers: Vec<i32> = records.iter().map(|r| r.is_new_customer).collect();
    let month_to_month: Vec<i32> = records.iter().map(|r| r.is_month_to_month).collect();
    let high_charges: Vec<i32> = records.iter().map(|r| r.is_high_monthly_charges).collect();
    let labels: Vec<i32> = records.iter().map(|r| r.churn_label).collect();

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM customer_churn_features")
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query(
        r"
        INSERT INTO customer_churn_features (
            customer_id, gender, senior_citizen, has_partner, has_dependents,
            tenure_months, contract_type, internet_service, payment_method,
            paperless_billing, monthly_charges, total_charges, is_new_customer,
            is_month_to_month, is_high_monthly_charges, churn_label
        )
        SELECT customer_id, gender, senior_citizen, has_partner, has_dependents,
               tenure_months, contract_type, internet_service, payment_method,
               paperless_billing, monthly_charges, total_charges, is_new_customer,
               is_month_to_month, is_high_monthly_charges, churn_label
        FROM unnest(
            $1::text[], $2::text[], $3::int4[], $4::bool[], $5::bool[],
            $6::int4[], $7::text[], $8::text[], $9::text[],
            $10::bool[], $11::float8[], $12::float8[], $13::int4[],
            $14::int4[], $15::int4[], $16::int4[]
        ) WITH ORDINALITY AS incoming (
            customer_id, gender, senior_citizen, has_partner, has_dependents,
            tenure_months, contract_type, internet_service, payment_method,
            paperless_billing, monthly_charges, total_charges, is_new_customer,
            is_month_to_month, is_high_monthly_charges, churn_label, position
        )
        ORDER BY position
        ",
    )
    .bind(&customer_ids)
    .bind(&genders)
    .bind(&senior_citizens)
    .bind(&partners)
    .bind(&dependents)
    .bind(&tenures)
    .bind(&contracts)
    .bind(&internet)
    .bind(&payments)
    .bind(&paperless)
    .bind(&monthly)
    .bind(&totals)
    .bind(&new_customers)
    .bind(&month_to_month)
    .bind(&high_charges)
    .bind(&labels)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(result.rows_affected())
}
