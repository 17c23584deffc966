use gophermart_engine::{
    db_types::{Balance, NewUser, NewWithdrawal, Order, OrderNumber, SettleOutcome, User, Withdrawal},
    traits::{LedgerDatabase, LedgerError},
};
use mockall::mock;

mock! {
    pub Ledger {}
    impl LedgerDatabase for Ledger {
        async fn user_add(&self, user: NewUser) -> Result<(), LedgerError>;
        async fn user_get(&self, user_id: &str) -> Result<Option<User>, LedgerError>;
        async fn order_add(&self, user_id: &str, number: &OrderNumber) -> Result<Order, LedgerError>;
        async fn order_get(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError>;
        async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, LedgerError>;
        async fn claim_unprocessed(&self) -> Result<Vec<Order>, LedgerError>;
        async fn update_order(&self, order: &Order) -> Result<(), LedgerError>;
        async fn credit_accrual(&self, order: &Order) -> Result<(), LedgerError>;
        async fn settle_order(&self, order: &Order) -> Result<SettleOutcome, LedgerError>;
        async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;
        async fn withdrawals_for_user(&self, user_id: &str) -> Result<Vec<Withdrawal>, LedgerError>;
        async fn balance_for_user(&self, user_id: &str) -> Result<Balance, LedgerError>;
        async fn close(&mut self) -> Result<(), LedgerError>;
    }
}
