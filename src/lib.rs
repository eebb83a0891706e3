pub mod config;       // layered settings (file, env, CLI)
pub mod engine;       // order book reconstruction
pub mod execution;    // signed private REST gateways
pub mod market_data;  // venue adapters, transport, stream driver
pub mod telemetry;    // tracing + metrics setup
pub mod trade_log;    // durable CSV record of trading actions
