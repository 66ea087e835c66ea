//! Transaction demarcation interceptor.
//!
//! Wraps everything further in — remaining interceptors, the action, and
//! the innermost render step — in one database transaction, so a view that
//! fails to render rolls back the same work the action did.
//!
//! The decision table:
//!
//! - Downstream returned `Ok` and commit is not suppressed: `commit`.
//! - `Ok` but the action called
//!   [`suppress_commit`](ExecutionContext::suppress_commit): `rollback`,
//!   response still returned.
//! - `commit` reported `Ok(false)` (driver already discarded the
//!   transaction): recorded as a rollback, response still returned.
//! - `commit` failed: best-effort `rollback`, failure propagated.
//! - Downstream failed: best-effort `rollback`, failure propagated
//!   unchanged so the error boundary outside this interceptor sees the
//!   original error.
//!
//! A context without a database connection passes through untouched, as
//! does a connection whose `begin` reports an already-active transaction:
//! whoever opened that transaction owns the decision.

use std::sync::Arc;

use daedalus_core::{BoxFuture, DaedalusError, DatabaseConnection, Response};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::chain::{Interceptor, Next};
use crate::context::{ExecutionContext, TransactionDecision};
use crate::error::{ChainError, ChainResult};
use crate::factory::FactoryContext;

/// Settings for the transaction interceptor.
///
/// No knobs today; present so misspelled settings fail loudly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransactionSettings {}

/// Constructs the interceptor for the `transaction` implementation id.
pub(crate) fn construct(
    _context: &FactoryContext,
    settings: serde_json::Value,
) -> Result<Arc<dyn Interceptor>, serde_json::Error> {
    let _settings: TransactionSettings = serde_json::from_value(settings)?;
    Ok(Arc::new(TransactionInterceptor::new()))
}

/// Interceptor that owns the per-request transaction.
#[derive(Debug, Clone, Default)]
pub struct TransactionInterceptor;

impl TransactionInterceptor {
    /// Creates a new transaction interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Rolls back and records the decision.
    ///
    /// A rollback failure is logged, not propagated: the connection
    /// provider must discard a transaction still open on return.
    async fn roll_back(
        ctx: &mut ExecutionContext,
        connection: &Arc<dyn DatabaseConnection>,
        reason: &str,
    ) -> Result<(), ChainError> {
        match connection.rollback().await {
            Ok(()) => debug!(request_id = %ctx.id(), reason, "Transaction rolled back"),
            Err(rollback_error) => error!(
                request_id = %ctx.id(),
                %rollback_error,
                reason,
                "Rollback failed, connection provider must discard the transaction"
            ),
        }
        ctx.record_transaction_decision(TransactionDecision::Rollback)?;
        Ok(())
    }
}

impl Interceptor for TransactionInterceptor {
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            let Some(connection) = ctx.connection().cloned() else {
                debug!(request_id = %ctx.id(), "No database connection, skipping transaction");
                return next.run(ctx).await;
            };

            let opened = connection.begin().await.map_err(|error| {
                DaedalusError::database_with_source("Failed to begin transaction", error)
            })?;
            if !opened {
                // Someone outside this chain opened the transaction and
                // owns the commit/rollback decision.
                debug!(request_id = %ctx.id(), "Joining transaction already active on this connection");
                return next.run(ctx).await;
            }
            ctx.mark_transaction_active();
            debug!(request_id = %ctx.id(), "Transaction opened");

            match next.run(ctx).await {
                Ok(response) => {
                    if ctx.commit_suppressed() {
                        debug!(request_id = %ctx.id(), "Commit suppressed by the action");
                        Self::roll_back(ctx, &connection, "commit suppressed").await?;
                        return Ok(response);
                    }
                    match connection.commit().await {
                        Ok(true) => {
                            ctx.record_transaction_decision(TransactionDecision::Commit)?;
                            debug!(request_id = %ctx.id(), "Transaction committed");
                            Ok(response)
                        }
                        Ok(false) => {
                            warn!(
                                request_id = %ctx.id(),
                                "Nothing to commit, driver already rolled the transaction back"
                            );
                            ctx.record_transaction_decision(TransactionDecision::Rollback)?;
                            Ok(response)
                        }
                        Err(commit_error) => {
                            let failure = DaedalusError::database_with_source(
                                "Failed to commit transaction",
                                commit_error,
                            );
                            Self::roll_back(ctx, &connection, "commit failed").await?;
                            Err(ChainError::Request(failure))
                        }
                    }
                }
                Err(failure) => {
                    Self::roll_back(ctx, &connection, "request failed").await?;
                    Err(failure)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainExecutor;
    use crate::context::{ChainState, TransactionPhase};
    use crate::fixtures::{
        chain_of, compiled_entry, executor, failing_action, ok_action, suppressing_action,
        test_context,
    };
    use daedalus_core::fixtures::{
        errored_connection, failing_commit_connection, failing_renderer, recording_connection,
        TxEvent,
    };
    use daedalus_core::Request;
    use serde_json::json;

    fn transaction_chain() -> Arc<crate::compile::RouteChain> {
        chain_of(
            "/test",
            vec![compiled_entry(
                "transaction",
                Arc::new(TransactionInterceptor::new()),
            )],
        )
    }

    #[tokio::test]
    async fn test_commits_on_success() {
        let connection = recording_connection();
        let mut ctx = test_context().with_connection(connection.clone());

        executor()
            .execute(transaction_chain(), ok_action("index"), &mut ctx)
            .await
            .unwrap();

        assert_eq!(connection.events(), vec![TxEvent::Begin, TxEvent::Commit]);
        assert_eq!(ctx.transaction_phase(), TransactionPhase::Committed);
    }

    #[tokio::test]
    async fn test_commits_when_downstream_short_circuits() {
        struct Gate;

        impl Interceptor for Gate {
            fn around<'a>(
                &'a self,
                ctx: &'a mut ExecutionContext,
                next: Next<'a>,
            ) -> BoxFuture<'a, ChainResult<Response>> {
                Box::pin(async move {
                    next.finish(ctx, daedalus_core::ResultDescriptor::redirect("/login"))
                        .await
                })
            }
        }

        let connection = recording_connection();
        let mut ctx = test_context().with_connection(connection.clone());
        let chain = chain_of(
            "/test",
            vec![
                compiled_entry("transaction", Arc::new(TransactionInterceptor::new())),
                compiled_entry("gate", Arc::new(Gate)),
            ],
        );

        // An abort is a normal unwind: the work done so far is kept.
        let response = executor()
            .execute(chain, failing_action("must not run"), &mut ctx)
            .await
            .unwrap();

        assert_eq!(response.location(), Some("/login"));
        assert_eq!(connection.events(), vec![TxEvent::Begin, TxEvent::Commit]);
        assert_eq!(ctx.transaction_phase(), TransactionPhase::Committed);
        assert_eq!(ctx.chain_state(), ChainState::Aborted);
    }

    #[tokio::test]
    async fn test_rolls_back_on_action_failure() {
        let connection = recording_connection();
        let mut ctx = test_context().with_connection(connection.clone());

        let result = executor()
            .execute(transaction_chain(), failing_action("boom"), &mut ctx)
            .await;

        assert!(matches!(
            result,
            Err(ChainError::Request(DaedalusError::Internal { .. }))
        ));
        assert_eq!(connection.events(), vec![TxEvent::Begin, TxEvent::Rollback]);
        assert_eq!(ctx.transaction_phase(), TransactionPhase::RolledBack);
    }

    #[tokio::test]
    async fn test_rolls_back_when_rendering_fails() {
        // Rendering happens inside the transaction scope, so a template
        // failure must undo the action's work.
        let connection = recording_connection();
        let mut ctx = test_context().with_connection(connection.clone());

        let result = ChainExecutor::new(failing_renderer())
            .execute(transaction_chain(), ok_action("index"), &mut ctx)
            .await;

        assert!(result.is_err());
        assert_eq!(connection.events(), vec![TxEvent::Begin, TxEvent::Rollback]);
    }

    #[tokio::test]
    async fn test_passes_through_without_connection() {
        let mut ctx = test_context();

        executor()
            .execute(transaction_chain(), ok_action("index"), &mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.transaction_phase(), TransactionPhase::Inactive);
    }

    #[tokio::test]
    async fn test_joins_already_active_transaction() {
        let connection = recording_connection();
        // The host opened a transaction before handing over the connection.
        assert!(connection.begin().await.unwrap());

        let mut ctx =
            ExecutionContext::new(Request::get("/test")).with_connection(connection.clone());

        executor()
            .execute(transaction_chain(), ok_action("index"), &mut ctx)
            .await
            .unwrap();

        // The outer owner decides; the interceptor neither committed nor
        // rolled back.
        assert_eq!(connection.events(), vec![TxEvent::Begin]);
        assert_eq!(ctx.transaction_phase(), TransactionPhase::Inactive);
        assert!(connection.in_transaction());
    }

    #[tokio::test]
    async fn test_commit_false_records_rollback_without_rollback_call() {
        let connection = errored_connection();
        let mut ctx = test_context().with_connection(connection.clone());

        let result = executor()
            .execute(transaction_chain(), ok_action("index"), &mut ctx)
            .await;

        assert!(result.is_ok());
        assert_eq!(connection.events(), vec![TxEvent::Begin, TxEvent::Commit]);
        assert_eq!(connection.rollback_count(), 0);
        assert_eq!(ctx.transaction_phase(), TransactionPhase::RolledBack);
    }

    #[tokio::test]
    async fn test_suppressed_commit_rolls_back_but_returns_response() {
        let connection = recording_connection();
        let mut ctx = test_context().with_connection(connection.clone());

        let response = executor()
            .execute(transaction_chain(), suppressing_action("preview"), &mut ctx)
            .await
            .unwrap();

        assert!(response.body_text().contains("preview"));
        assert_eq!(connection.events(), vec![TxEvent::Begin, TxEvent::Rollback]);
        assert_eq!(ctx.transaction_phase(), TransactionPhase::RolledBack);
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back_and_propagates() {
        let connection = failing_commit_connection();
        let mut ctx = test_context().with_connection(connection.clone());

        let result = executor()
            .execute(transaction_chain(), ok_action("index"), &mut ctx)
            .await;

        assert!(matches!(
            result,
            Err(ChainError::Request(DaedalusError::Database { .. }))
        ));
        assert_eq!(
            connection.events(),
            vec![TxEvent::Begin, TxEvent::Commit, TxEvent::Rollback]
        );
        assert_eq!(ctx.transaction_phase(), TransactionPhase::RolledBack);
    }

    #[test]
    fn test_construct_rejects_unknown_settings() {
        let context = FactoryContext::default();
        assert!(construct(&context, json!({ "isolation": "serializable" })).is_err());
        assert!(construct(&context, json!({})).is_ok());
    }
}
