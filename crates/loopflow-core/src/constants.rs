//! Protocol constants shared by the engine, the gateway and the CLI.

/// Separates the referenced transaction id from the output index in a descriptor.
pub const DESCRIPTOR_SEPARATOR: char = ':';

/// Separates descriptors in the `transactions` wire field.
pub const BATCH_SEPARATOR: char = ',';

/// Owner credited with self-funded outputs when the miner names none.
pub const DEFAULT_COINBASE_ADDRESS: &str = "coinbase";

/// Default TCP port for the HTTP gateway.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Placeholder body returned by `/mine_block`. Carries no status.
pub const MINE_BLOCK_ACK: &str = "-1";

/// Prefix of the `/count_cycles` response body.
pub const CYCLE_COUNT_PREFIX: &str = "NumberOfCycles: ";
