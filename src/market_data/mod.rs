// Market data module entrypoint
pub mod adapters;       // venue-specific feed parsers (bitFlyer, GMO Coin)
pub mod normaliser;     // converts wire numbers/strings -> Decimal levels
pub mod transport;      // websocket connection behind a small trait
pub mod driver;         // pumps one connection into one order book engine
