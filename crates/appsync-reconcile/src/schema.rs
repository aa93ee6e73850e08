//! Schema submission and creation polling.
//!
//! ```text
//!   idle ──submit──► processing ──poll──► SUCCESS | NOT_APPLICABLE
//!                        │                  FAILED  ──► SchemaCreationFailed
//!                        └── attempts exhausted ──► Timeout
//! ```

use appsync_config::SyncOptions;
use appsync_core::{CoreError, Mode, checksum};
use appsync_provider::{SchemaCreationStatus, SchemaStatus};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::error::{SyncError, SyncResult};
use crate::support::{ApiContext, pause};

/// Result of converging the schema: the checksum to persist and what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOutcome {
    pub checksum: Option<String>,
    pub mode: Mode,
}

/// Uploads `schema` when its checksum differs from `prior_checksum` and
/// waits for the service to finish building it.
///
/// `schema` is inline SDL or a path resolved through the template source.
/// An API this tool created must declare a schema; for an imported API a
/// missing schema leaves the remote one untouched.
#[instrument(skip_all, fields(api_id = %ctx.api_id))]
pub async fn converge_schema(
    ctx: &ApiContext<'_>,
    schema: Option<&str>,
    prior_checksum: Option<&str>,
    owned: bool,
    options: &SyncOptions,
    cancel: &CancellationToken,
) -> SyncResult<SchemaOutcome> {
    let Some(schema) = schema else {
        if owned {
            return Err(CoreError::missing_field("graphql api", "schema").into());
        }
        tracing::debug!("no schema declared for imported API, leaving it untouched");
        return Ok(SchemaOutcome {
            checksum: prior_checksum.map(str::to_string),
            mode: Mode::Ignore,
        });
    };

    let definition = ctx.templates.read_if_file(schema)?;
    let digest = checksum(&definition);
    if prior_checksum == Some(digest.as_str()) {
        tracing::debug!(checksum = %digest, "schema unchanged");
        return Ok(SchemaOutcome {
            checksum: Some(digest),
            mode: Mode::Ignore,
        });
    }

    let mut status = ctx
        .provider
        .start_schema_creation(ctx.api_id, &definition)
        .await?;
    tracing::info!(checksum = %digest, status = %status.status, "schema submitted");

    let mut attempts = 0;
    while !status.status.is_terminal() {
        if attempts >= options.max_poll_attempts {
            return Err(SyncError::timeout(ctx.api_id, attempts));
        }
        pause(options.poll_interval(), cancel).await?;
        status = ctx.provider.get_schema_creation_status(ctx.api_id).await?;
        attempts += 1;
        tracing::debug!(attempt = attempts, status = %status.status, "schema creation status");
    }

    finish(ctx.api_id, status)?;
    tracing::info!(checksum = %digest, polls = attempts, "schema created");
    Ok(SchemaOutcome {
        checksum: Some(digest),
        mode: if prior_checksum.is_some() {
            Mode::Update
        } else {
            Mode::Create
        },
    })
}

fn finish(api_id: &str, status: SchemaStatus) -> SyncResult<()> {
    match status.status {
        SchemaCreationStatus::Failed => Err(SyncError::schema_failed(
            api_id,
            status.details.unwrap_or_else(|| "no details reported".to_string()),
        )),
        // Reported when the service has nothing to build, e.g. an identical definition.
        SchemaCreationStatus::Success | SchemaCreationStatus::NotApplicable => Ok(()),
        other => Err(SyncError::schema_failed(
            api_id,
            format!("unexpected terminal status {other}"),
        )),
    }
}
