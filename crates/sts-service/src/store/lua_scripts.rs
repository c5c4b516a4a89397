//! Lua scripts for atomic store operations.
//!
//! Scripts run atomically on the Redis server, so the read-modify-write
//! sequences below cannot interleave with other clients.

/// Increment a fixed-window counter and start its expiry on first use.
///
/// Arguments:
/// - KEYS[1]: Counter key (e.g., `rate_limit:{address}`)
/// - ARGV[1]: Window length in seconds
///
/// Returns:
/// - The counter value after the increment
///
/// A counter left without an expiry (TTL -1) is given one, so a key can
/// never pin a client in a permanently limited state.
pub const INCREMENT_WITH_EXPIRY: &str = r#"
local count = redis.call('INCR', KEYS[1])
local window = tonumber(ARGV[1])

if count == 1 or redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], window)
end

return count
"#;
