use std::env;

use anyhow::{bail, Result};

pub const FRECKLE_TOKEN_VAR_NAME: &str = "FRECKLE_APP_TOKEN";
pub const LIBRATO_ACCOUNT_VAR_NAME: &str = "LIBRATO_ACCOUNT";
pub const LIBRATO_TOKEN_VAR_NAME: &str = "LIBRATO_TOKEN";

/// Libratoの認証情報。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibratoCredentials {
    pub account: String,
    pub token: String,
}

/// 環境変数から読み込む設定。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub freckle_token: String,
    /// `LIBRATO_ACCOUNT`と`LIBRATO_TOKEN`の両方が設定されている場合のみ`Some`。
    pub librato: Option<LibratoCredentials>,
}

impl Config {
    /// 環境変数から設定を読み込む。
    ///
    /// 環境変数`FRECKLE_APP_TOKEN`が設定されていない場合はエラーを返す。空文字列は未設定として扱う。
    pub fn from_env() -> Result<Self> {
        let Some(freckle_token) = non_empty_var(FRECKLE_TOKEN_VAR_NAME) else {
            bail!("{} environment variable is not set", FRECKLE_TOKEN_VAR_NAME);
        };
        let librato = match (
            non_empty_var(LIBRATO_ACCOUNT_VAR_NAME),
            non_empty_var(LIBRATO_TOKEN_VAR_NAME),
        ) {
            (Some(account), Some(token)) => Some(LibratoCredentials { account, token }),
            _ => None,
        };

        Ok(Self {
            freckle_token,
            librato,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}
