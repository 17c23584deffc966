use gm_common::Points;
use serde::Deserialize;

/// Body of `POST /api/user/register` and `POST /api/user/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// Body of `POST /api/user/balance/withdraw`.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Points,
}
