//! Repository functions for training runs and their scores.

use churn_structs::{CustomerScore, ModelRun, NewModelRun};
use sqlx::PgPool;
use uuid::Uuid;

/// Inserts one run record; `ran_at` is set by the database.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn insert_model_run(pool: &PgPool, run: &NewModelRun) -> Result<ModelRun, sqlx::Error> {
    sqlx::query_as::<_, ModelRun>(
        r"
        INSERT INTO model_runs
            (run_id, ran_at, model_name, train_rows, test_rows, roc_auc, pr_auc, chosen_threshold, notes)
        VALUES ($1, NOW(), $2, $3, $4, $5, $6, $7, $8)
        RETURNING run_id, ran_at, model_name, train_rows, test_rows, roc_auc, pr_auc, chosen_threshold, notes
        ",
    )
    .bind(run.run_id)
    .bind(&run.model_name)
    .bind(run.train_rows)
    .bind(run.test_rows)
    .bind(run.roc_auc)
    .bind(run.pr_auc)
    .bind(run.chosen_threshold)
    .bind(&run.notes)
    .fetch_one(pool)
    .await
}

/// Bulk-inserts scores with a single statement.
///
/// `scored_at` strings are cast to timestamps by the database.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn insert_customer_scores(
    pool: &PgPool,
    scores: &[CustomerScore],
) -> Result<u64, sqlx::Error> {
    if scores.is_empty() {
        return Ok(0);
    }

    let run_ids: Vec<Uuid> = scores.iter().map(|s| s.run_id).collect();
    let customer_ids: Vec<String> = scores.iter().map(|s| s.customer_id.clone()).collect();
    let scored_at: Vec<String> = scores.iter().map(|s| s.scored_at.clone()).collect();
    let model_names: Vec<String> = scores.iter().map(|s| s.model_name.clone()).collect();
    let probas: Vec<f64> = scores.iter().map(|s| s.churn_proba).collect();
    let preds: Vec<i32> = scores.iter().map(|s| s.churn_pred).collect();

    let result = sqlx::query(
        r"
        INSERT INTO customer_churn_scores
            (run_id, customer_id, scored_at, model_name, churn_proba, churn_pred)
        SELECT run_id, customer_id, scored_at::timestamp, model_name, churn_proba, churn_pred
        FROM unnest($1::uuid[], $2::text[], $3::text[], $4::text[], $5::float8[], $6::int4[])
            AS s(run_id, customer_id, scored_at, model_name, churn_proba, churn_pred)
        ",
    )
    .bind(&run_ids)
    .bind(&customer_ids)
    .bind(&scored_at)
    .bind(&model_names)
    .bind(&probas)
    .bind(&preds)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
