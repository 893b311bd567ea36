//! Request entry points.
//!
//! [`QueryEngine`] ties the shared schema map to an [`Executor`]: each call
//! parses nothing itself (requests arrive with parsed filters), assembles
//! one query shape, renders it for the configured dialect and executes it
//! under the configured timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::assemble::{
    assemble_rows, assemble_summary, assemble_unique_values, Page, RowsRequest, SummaryRequest,
    UniqueValuesRequest,
};
use crate::config::Settings;
use crate::error::{QueryError, QueryResult};
use crate::executor::{Executor, Row};
use crate::response::{ColumnsResponse, PagedResponse, ReleaseMetadata, SummaryResponse};
use crate::schema::SchemaMap;
use crate::sql::Dialect;

pub struct QueryEngine {
    schema: Arc<SchemaMap>,
    settings: Settings,
    executor: Arc<dyn Executor>,
}

impl QueryEngine {
    pub fn new(schema: Arc<SchemaMap>, settings: Settings, executor: Arc<dyn Executor>) -> Self {
        Self {
            schema,
            settings,
            executor,
        }
    }

    pub fn schema(&self) -> &SchemaMap {
        &self.schema
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn dialect(&self) -> Dialect {
        self.settings.query.dialect
    }

    /// Default and clamp the requested limit.
    fn page(&self, page: Page) -> Page {
        Page {
            limit: Some(self.settings.query.effective_limit(page.limit)),
            offset: page.offset,
        }
    }

    /// Paged entity rows.
    pub async fn fetch_rows(&self, mut request: RowsRequest) -> QueryResult<PagedResponse> {
        let span = info_span!(
            "fetch_rows",
            query_id = %Uuid::new_v4(),
            entity = %request.entity
        );
        async move {
            info!(filters = %request.filters, "Fetching rows");
            request.page = self.page(request.page);
            let paged = assemble_rows(&self.schema, &request)?;
            let (sql, count_sql) = paged.to_sql(self.dialect());

            let rows = self.rows(&sql).await?;
            let total = self.count(&count_sql).await?;
            Ok(PagedResponse::new(rows, total, request.page.offset, true, sql))
        }
        .instrument(span)
        .await
    }

    /// The single summary row.
    pub async fn summary(&self, request: SummaryRequest) -> QueryResult<SummaryResponse> {
        let span = info_span!(
            "summary",
            query_id = %Uuid::new_v4(),
            entity = %request.entity
        );
        async move {
            info!(filters = %request.filters, "Summarizing");
            let sql = assemble_summary(&self.schema, &request)?.to_sql(self.dialect());
            let result = self.rows(&sql).await?;
            Ok(SummaryResponse {
                result,
                query_sql: sql,
            })
        }
        .instrument(span)
        .await
    }

    /// Paged distinct values of one column.
    pub async fn unique_values(&self, mut request: UniqueValuesRequest) -> QueryResult<PagedResponse> {
        let span = info_span!(
            "unique_values",
            query_id = %Uuid::new_v4(),
            column = %request.column
        );
        async move {
            info!(system = ?request.system, count = request.count, "Listing unique values");
            request.page = self.page(request.page);
            let paged = assemble_unique_values(&self.schema, &request)?;
            let (sql, count_sql) = paged.to_sql(self.dialect());

            let rows = self.rows(&sql).await?;
            let total = self.count(&count_sql).await?;
            Ok(PagedResponse::new(
                rows,
                total,
                request.page.offset,
                request.total_count,
                sql,
            ))
        }
        .instrument(span)
        .await
    }

    /// Column listing for every entity table.
    pub fn columns(&self) -> ColumnsResponse {
        ColumnsResponse::from_schema(&self.schema)
    }

    pub fn release_metadata(&self) -> ReleaseMetadata {
        ReleaseMetadata::from_schema(&self.schema)
    }

    async fn rows(&self, sql: &str) -> QueryResult<Vec<Row>> {
        debug!(sql, "Executing query");
        let started = Instant::now();
        let rows = self.with_timeout(self.executor.fetch_rows(sql)).await?;
        info!(
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query executed"
        );
        Ok(rows)
    }

    async fn count(&self, sql: &str) -> QueryResult<u64> {
        debug!(sql, "Executing count");
        let started = Instant::now();
        let count = self.with_timeout(self.executor.fetch_count(sql)).await?;
        info!(
            count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Count executed"
        );
        u64::try_from(count)
            .map_err(|_| QueryError::Execution(format!("negative row count: {count}")))
    }

    async fn with_timeout<T>(&self, fut: impl Future<Output = QueryResult<T>>) -> QueryResult<T> {
        let timeout = self.settings.query.timeout();
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout {
                seconds: timeout.as_secs(),
            }),
        }
    }
}
