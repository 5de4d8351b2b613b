use std::env;

pub enum Environment {
    Development,
    Production,
}

/// ENV 環境変数から実行環境を判定する。
/// 未設定の場合、デバッグビルドでは Development、リリースビルドでは Production になる。
pub fn which() -> Environment {
    #[cfg(debug_assertions)]
    let default_env = Environment::Development;
    #[cfg(not(debug_assertions))]
    let default_env = Environment::Production;

    match env::var("ENV") {
        Err(_) => default_env,
        Ok(v) => match v.as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        },
    }
}
