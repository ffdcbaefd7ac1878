mod refresh_token_ledger_mysql;

pub use refresh_token_ledger_mysql::*;

mod util;
