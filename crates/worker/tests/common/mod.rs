//! Common test utilities for integration tests.
//!
//! These tests run against a real PostgreSQL database named by the
//! `TEST_DATABASE_URL` environment variable. When the variable is not
//! set the tests skip themselves, since the job and review tables are
//! owned by the submitting application and no local default exists.

// Allow dead code in this module - these are helper utilities that may not
// be used by every integration test.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::Mutex;

/// Serializes database tests within this binary; they share one set of
/// tables and assertions like `count_processing` see global state.
pub static DB_LOCK: Mutex<()> = Mutex::const_new(());

/// Connects to the test database, or returns `None` (skipping the
/// test) when `TEST_DATABASE_URL` is not set.
pub async fn try_create_test_pool() -> Option<PgPool> {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    Some(pool)
}

/// Creates the job and review tables the worker reads and writes.
/// Idempotent; the production schema is owned by the submitting
/// application, this is its test-side equivalent.
pub async fn setup_schema(pool: &PgPool) {
    let statements = [
        r#"DO $$ BEGIN
               CREATE TYPE "StatusExport" AS ENUM ('idle', 'processing', 'done', 'error');
           EXCEPTION WHEN duplicate_object THEN NULL;
           END $$"#,
        r#"CREATE TABLE IF NOT EXISTS public."User" (
               id SERIAL PRIMARY KEY,
               email TEXT NOT NULL
           )"#,
        r#"CREATE TABLE IF NOT EXISTS public."Product" (
               id SERIAL PRIMARY KEY,
               title TEXT NOT NULL
           )"#,
        r#"CREATE TABLE IF NOT EXISTS public."Export" (
               id SERIAL PRIMARY KEY,
               user_id INT NOT NULL,
               product_id INT NOT NULL,
               params TEXT,
               type TEXT,
               status "StatusExport" NOT NULL DEFAULT 'idle',
               "startDate" TIMESTAMPTZ,
               "endDate" TIMESTAMPTZ,
               progress INT NOT NULL DEFAULT 0,
               link TEXT,
               attempts INT NOT NULL DEFAULT 0,
               created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
           )"#,
        r#"CREATE TABLE IF NOT EXISTS public."Review" (
               id SERIAL PRIMARY KEY,
               form_id INT,
               product_id INT NOT NULL,
               button_id INT,
               xwiki_id INT,
               user_id INT,
               created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
           )"#,
        r#"CREATE TABLE IF NOT EXISTS public."Answer" (
               id SERIAL PRIMARY KEY,
               review_id INT NOT NULL,
               field_label TEXT NOT NULL,
               field_code TEXT NOT NULL,
               answer_text TEXT,
               intention TEXT,
               parent_answer_id INT,
               created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
           )"#,
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .expect("Failed to create test schema");
    }
}

/// Empties every table touched by the tests.
pub async fn cleanup_test_data(pool: &PgPool) {
    for table in [r#""Answer""#, r#""Review""#, r#""Export""#, r#""Product""#, r#""User""#] {
        sqlx::query(&format!("DELETE FROM public.{}", table))
            .execute(pool)
            .await
            .expect("Failed to clean test table");
    }
}

pub async fn insert_user(pool: &PgPool, email: &str) -> i32 {
    sqlx::query_scalar(r#"INSERT INTO public."User" (email) VALUES ($1) RETURNING id"#)
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("Failed to insert test user")
}

pub async fn insert_product(pool: &PgPool, title: &str) -> i32 {
    sqlx::query_scalar(r#"INSERT INTO public."Product" (title) VALUES ($1) RETURNING id"#)
        .bind(title)
        .fetch_one(pool)
        .await
        .expect("Failed to insert test product")
}

pub struct ExportRowSpec {
    pub user_id: i32,
    pub product_id: i32,
    pub status: &'static str,
    pub started_at: Option<DateTime<Utc>>,
    pub attempts: i32,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_export(pool: &PgPool, spec: &ExportRowSpec) -> i32 {
    sqlx::query_scalar(
        r#"
        INSERT INTO public."Export"
            (user_id, product_id, type, status, "startDate", attempts, progress, created_at)
        VALUES ($1, $2, 'csv', $3::"StatusExport", $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(spec.user_id)
    .bind(spec.product_id)
    .bind(spec.status)
    .bind(spec.started_at)
    .bind(spec.attempts)
    .bind(spec.progress)
    .bind(spec.created_at)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test export")
}

/// Status, start timestamp, attempts, and progress of one job row.
pub async fn export_row(
    pool: &PgPool,
    id: i32,
) -> (String, Option<DateTime<Utc>>, i32, i32) {
    sqlx::query_as(
        r#"SELECT status::text, "startDate", attempts, progress FROM public."Export" WHERE id = $1"#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .expect("Failed to read test export row")
}

pub async fn insert_review(pool: &PgPool, product_id: i32, created_at: DateTime<Utc>) -> i32 {
    sqlx::query_scalar(
        r#"INSERT INTO public."Review" (product_id, created_at) VALUES ($1, $2) RETURNING id"#,
    )
    .bind(product_id)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test review")
}

pub async fn insert_answer(
    pool: &PgPool,
    review_id: i32,
    field_label: &str,
    answer_text: &str,
    created_at: DateTime<Utc>,
) -> i32 {
    sqlx::query_scalar(
        r#"
        INSERT INTO public."Answer" (review_id, field_label, field_code, answer_text, created_at)
        VALUES ($1, $2, lower($2), $3, $4)
        RETURNING id
        "#,
    )
    .bind(review_id)
    .bind(field_label)
    .bind(answer_text)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test answer")
}
