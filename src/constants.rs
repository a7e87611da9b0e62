/// Application constants

// Message templates
pub const DEFAULT_APP_NAME: &str = "RockChain";

// Points configuration
pub const POINTS_DAILY_CLAIM: i64 = 5;
pub const POINTS_REFERRAL_CLAIM: i64 = 10;
pub const POINTS_GAME_WIN: i64 = 10;
pub const POINTS_GAME_DRAW: i64 = 2;
pub const POINTS_GAME_LOSS: i64 = 0;

// Daily claim windows
pub const DAILY_CLAIM_COOLDOWN_HOURS: i64 = 24;
pub const DAILY_STREAK_WINDOW_HOURS: i64 = 48; // previous claim older than this resets the streak

// Signed message freshness
pub const MESSAGE_MAX_AGE_SECS: i64 = 300; // 5 minutes
pub const MESSAGE_MAX_FUTURE_SKEW_SECS: i64 = 30;

// Users
pub const USERNAME_MAX_LEN: usize = 50;
pub const DEFAULT_USERNAME_PREFIX: &str = "Player_";

// Leaderboard
pub const LEADERBOARD_SIZE: i64 = 10;
pub const RANK_REFRESH_INTERVAL_SECS: u64 = 60;

// Storage
pub const DATABASE_MAX_CONNECTIONS: u32 = 20;
pub const DATABASE_ACQUIRE_TIMEOUT_SECS: u64 = 5;
pub const MEMORY_DATABASE_URL: &str = "memory://";

// Game reward table: (game id, reward URI)
pub const GAME_REWARD_URIS: [(&str, &str); 10] = [
    ("rps", "ipfs://rps-nft"),
    ("coin", "ipfs://coin-nft"),
    ("dice", "ipfs://dice-nft"),
    ("guess", "ipfs://guess-nft"),
    ("tictactoe", "ipfs://tictactoe-nft"),
    ("blackjack", "ipfs://blackjack-nft"),
    ("memory", "ipfs://memory-nft"),
    ("2048", "ipfs://2048-nft"),
    ("reaction", "ipfs://reaction-nft"),
    ("scramble", "ipfs://scramble-nft"),
];
