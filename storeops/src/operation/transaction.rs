use crate::errors::OpsResult;
use crate::store::{Changes, StoreProvider};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionState {
    NoTransaction,
    Open,
    MarkedSuccessful,
    Closed,
}

/// Drives the begin / mark successful / end protocol around one batch and
/// decides when change notifications go out.
///
/// The transaction is ended exactly once: by [`close`](Self::close) on the
/// success path, or by `Drop` when the batch bails out early with `?`. An
/// error from ending the transaction in `Drop` can't be returned, so it is
/// logged.
pub(crate) struct TransactionCoordinator<'a> {
    provider: &'a dyn StoreProvider,
    state: TransactionState,
    operations: usize,
}

impl<'a> TransactionCoordinator<'a> {
    pub(crate) fn begin(provider: &'a dyn StoreProvider, use_transaction: bool) -> OpsResult<Self> {
        if !use_transaction {
            return Ok(TransactionCoordinator {
                provider,
                state: TransactionState::NoTransaction,
                operations: 0,
            });
        }

        provider.begin_transaction()?;
        log::debug!("Transaction started");
        Ok(TransactionCoordinator {
            provider,
            state: TransactionState::Open,
            operations: 0,
        })
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> TransactionState {
        self.state
    }

    /// Called after each successful entity. Notifies immediately when no
    /// transaction wraps the batch, even if the operation touched no table.
    pub(crate) fn after_operation(&mut self, affected_tables: &HashSet<String>) -> OpsResult<()> {
        self.operations += 1;
        if self.state == TransactionState::NoTransaction {
            self.notify(affected_tables)?;
        }
        Ok(())
    }

    /// Marks the transaction successful and publishes the coalesced change
    /// set. A batch that ran no operation publishes nothing.
    pub(crate) fn commit(&mut self, affected_tables: &HashSet<String>) -> OpsResult<()> {
        if self.state != TransactionState::Open {
            return Ok(());
        }

        self.provider.set_transaction_successful()?;
        self.state = TransactionState::MarkedSuccessful;
        if self.operations == 0 {
            return Ok(());
        }
        self.notify(affected_tables)
    }

    pub(crate) fn close(mut self) -> OpsResult<()> {
        self.end()
    }

    fn notify(&self, affected_tables: &HashSet<String>) -> OpsResult<()> {
        self.provider
            .notify_about_changes(Changes::new_instance(affected_tables.iter().cloned()))
    }

    fn end(&mut self) -> OpsResult<()> {
        match self.state {
            TransactionState::Open | TransactionState::MarkedSuccessful => {
                let committed = self.state == TransactionState::MarkedSuccessful;
                self.state = TransactionState::Closed;
                self.provider.end_transaction()?;
                log::debug!("Transaction ended, committed: {}", committed);
                Ok(())
            }
            TransactionState::NoTransaction | TransactionState::Closed => Ok(()),
        }
    }
}

impl Drop for TransactionCoordinator<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.end() {
            log::error!("Failed to end transaction: {}", e);
        }
    }
}
