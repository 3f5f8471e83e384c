//! Driving port for reading deposits.

use async_trait::async_trait;

use crate::domain::{Deposit, DepositDetail, DepositId, DepositStatus, Error, UserId};

/// Driving port for deposit reads, scoped to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DepositQuery: Send + Sync {
    /// Full detail of one deposit, visible to its customer and the back
    /// office.
    async fn detail(&self, caller: UserId, id: DepositId) -> Result<DepositDetail, Error>;

    /// Deposits visible to `caller`: everything for the back office, own
    /// deposits for customers.
    async fn list(
        &self,
        caller: UserId,
        status: Option<DepositStatus>,
    ) -> Result<Vec<Deposit>, Error>;
}

/// Fixture query with no deposits.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDepositQuery;

#[async_trait]
impl DepositQuery for FixtureDepositQuery {
    async fn detail(&self, _caller: UserId, id: DepositId) -> Result<DepositDetail, Error> {
        Err(Error::not_found(format!("deposit {id} not found")))
    }

    async fn list(
        &self,
        _caller: UserId,
        _status: Option<DepositStatus>,
    ) -> Result<Vec<Deposit>, Error> {
        Ok(Vec::new())
    }
}
