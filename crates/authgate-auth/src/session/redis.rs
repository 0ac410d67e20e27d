//! Redis-backed session store.
//!
//! Every mutation runs as a single Lua script so Redis executes it without
//! interleaving. Keys are passed through `KEYS` where the caller knows
//! them; keys the script can only discover (the user index on rotation and
//! delete) are derived from prefix arguments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Script};
use tracing::{debug, warn};

use authgate_cache::keys;
use authgate_cache::redis::RedisClient;
use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_core::types::UserId;
use authgate_entity::session::{Session, SessionTtls};

use super::store::{JtiRotation, SessionStore};

/// KEYS: session hash, JTI pointer, user index.
/// ARGV: id, user_id, device, ip, created_at, updated_at, expires_at,
/// current_jti, session_ttl, jti_ttl.
const CREATE_SCRIPT: &str = r"
local session_ttl = tonumber(ARGV[9])
local jti_ttl = tonumber(ARGV[10])

redis.call('HSET', KEYS[1],
  'id', ARGV[1], 'user_id', ARGV[2], 'device', ARGV[3], 'ip', ARGV[4],
  'created_at', ARGV[5], 'updated_at', ARGV[6], 'expires_at', ARGV[7],
  'current_jti', ARGV[8])
redis.call('EXPIRE', KEYS[1], session_ttl)
redis.call('SET', KEYS[2], KEYS[1], 'EX', jti_ttl)
redis.call('SADD', KEYS[3], KEYS[1])
if redis.call('TTL', KEYS[3]) < session_ttl then
  redis.call('EXPIRE', KEYS[3], session_ttl)
end
return 1
";

/// KEYS: old JTI pointer, new JTI pointer.
/// ARGV: new_jti, ip, device, updated_at, expires_at, session_ttl, jti_ttl,
/// user index prefix.
///
/// Returns `{1, session_id}` or `{0, reason}`.
const ROTATE_SCRIPT: &str = r"
local session_key = redis.call('GET', KEYS[1])
if not session_key then
  return {0, 'unknown_jti'}
end
if redis.call('DEL', KEYS[1]) == 0 then
  return {0, 'already_used'}
end
if redis.call('EXISTS', session_key) == 0 then
  return {0, 'session_gone'}
end

local session_ttl = tonumber(ARGV[6])
local jti_ttl = tonumber(ARGV[7])

redis.call('SET', KEYS[2], session_key, 'EX', jti_ttl)
redis.call('HSET', session_key,
  'current_jti', ARGV[1], 'ip', ARGV[2], 'device', ARGV[3],
  'updated_at', ARGV[4], 'expires_at', ARGV[5])
redis.call('EXPIRE', session_key, session_ttl)

local user_id = redis.call('HGET', session_key, 'user_id')
if user_id then
  local index_key = ARGV[8] .. user_id
  if redis.call('TTL', index_key) < session_ttl then
    redis.call('EXPIRE', index_key, session_ttl)
  end
end
return {1, redis.call('HGET', session_key, 'id')}
";

/// KEYS: session hashes. ARGV: user index prefix, JTI pointer prefix.
const DELETE_SCRIPT: &str = r"
local removed = 0
for _, session_key in ipairs(KEYS) do
  local fields = redis.call('HMGET', session_key, 'user_id', 'current_jti')
  if fields[1] then
    redis.call('SREM', ARGV[1] .. fields[1], session_key)
  end
  if fields[2] then
    redis.call('DEL', ARGV[2] .. fields[2])
  end
  removed = removed + redis.call('DEL', session_key)
end
return removed
";

/// KEYS: user index.
const LIST_SCRIPT: &str = r"
local sessions = {}
for _, session_key in ipairs(redis.call('SMEMBERS', KEYS[1])) do
  local fields = redis.call('HGETALL', session_key)
  if #fields > 0 then
    table.insert(sessions, fields)
  end
end
return sessions
";

/// KEYS: user index.
const PRUNE_SCRIPT: &str = r"
local removed = 0
for _, session_key in ipairs(redis.call('SMEMBERS', KEYS[1])) do
  if redis.call('EXISTS', session_key) == 0 then
    removed = removed + redis.call('SREM', KEYS[1], session_key)
  end
end
return removed
";

/// Number of keys requested per SCAN page while sweeping.
const SCAN_COUNT: usize = 200;

/// [`SessionStore`] over Redis hashes, strings, and sets.
#[derive(Debug, Clone)]
pub struct RedisSessionStore {
    client: RedisClient,
    create: Script,
    rotate: Script,
    delete: Script,
    list: Script,
    prune: Script,
}

impl RedisSessionStore {
    /// Create a store on the shared Redis client.
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            create: Script::new(CREATE_SCRIPT),
            rotate: Script::new(ROTATE_SCRIPT),
            delete: Script::new(DELETE_SCRIPT),
            list: Script::new(LIST_SCRIPT),
            prune: Script::new(PRUNE_SCRIPT),
        }
    }

    fn session_key(&self, session_id: &str) -> String {
        self.client.prefixed_key(&keys::session_hash(session_id))
    }

    fn jti_key(&self, jti: &str) -> String {
        self.client.prefixed_key(&keys::jti_pointer(jti))
    }

    fn index_key(&self, user_id: UserId) -> String {
        self.client.prefixed_key(&keys::user_sessions(user_id))
    }

    fn index_prefix(&self) -> String {
        self.client.prefixed_key(&keys::user_sessions(""))
    }

    fn jti_prefix(&self) -> String {
        self.client.prefixed_key(&keys::jti_pointer(""))
    }

    async fn prune_index(&self, index_key: &str) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let removed: u64 = self
            .client
            .with_deadline("prune", self.prune.key(index_key).invoke_async(&mut conn))
            .await?;
        Ok(removed)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, session: &Session, ttls: SessionTtls) -> AppResult<()> {
        if !ttls.is_valid() {
            return Err(AppError::invalid_input("session and JTI TTLs must be positive"));
        }

        let mut conn = self.client.conn_mut();
        let mut invocation = self.create.prepare_invoke();
        invocation
            .key(self.session_key(&session.id))
            .key(self.jti_key(&session.current_jti))
            .key(self.index_key(session.user_id))
            .arg(&session.id)
            .arg(session.user_id.to_string())
            .arg(&session.device)
            .arg(&session.ip)
            .arg(session.created_at.timestamp())
            .arg(session.updated_at.timestamp())
            .arg(session.expires_at.timestamp())
            .arg(&session.current_jti)
            .arg(ttls.session_ttl_seconds)
            .arg(ttls.jti_ttl_seconds);

        let _: i64 = self
            .client
            .with_deadline("create session", invocation.invoke_async(&mut conn))
            .await?;

        debug!(session_id = %session.id, user_id = %session.user_id, "Session written to Redis");
        Ok(())
    }

    async fn rotate_jti(&self, rotation: &JtiRotation) -> AppResult<String> {
        if !rotation.ttls.is_valid() {
            return Err(AppError::invalid_input("session and JTI TTLs must be positive"));
        }

        let mut conn = self.client.conn_mut();
        let mut invocation = self.rotate.prepare_invoke();
        invocation
            .key(self.jti_key(&rotation.old_jti))
            .key(self.jti_key(&rotation.new_jti))
            .arg(&rotation.new_jti)
            .arg(&rotation.ip)
            .arg(&rotation.device)
            .arg(rotation.updated_at.timestamp())
            .arg(rotation.expires_at.timestamp())
            .arg(rotation.ttls.session_ttl_seconds)
            .arg(rotation.ttls.jti_ttl_seconds)
            .arg(self.index_prefix());

        let (status, value): (i64, String) = self
            .client
            .with_deadline("rotate jti", invocation.invoke_async(&mut conn))
            .await?;

        if status == 1 {
            Ok(value)
        } else {
            debug!(reason = %value, "JTI rotation refused");
            Err(AppError::unauthorized(
                "Refresh token is invalid, expired, or already used",
            ))
        }
    }

    async fn exists_jti(&self, jti: &str) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let key = self.jti_key(jti);
        self.client
            .with_deadline("EXISTS", conn.exists(&key))
            .await
    }

    async fn get(&self, session_id: &str) -> AppResult<Option<Session>> {
        let mut conn = self.client.conn_mut();
        let key = self.session_key(session_id);
        let fields: HashMap<String, String> = self
            .client
            .with_deadline("HGETALL", conn.hgetall(&key))
            .await?;

        if fields.is_empty() {
            return Ok(None);
        }
        Ok(parse_session(&key, &fields))
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Session>> {
        let mut conn = self.client.conn_mut();
        let index_key = self.index_key(user_id);
        let records: Vec<HashMap<String, String>> = self
            .client
            .with_deadline("list sessions", self.list.key(&index_key).invoke_async(&mut conn))
            .await?;

        Ok(records
            .iter()
            .filter_map(|fields| parse_session(&index_key, fields))
            .collect())
    }

    async fn delete(&self, session_ids: &[String]) -> AppResult<u64> {
        if session_ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.client.conn_mut();
        let mut invocation = self.delete.prepare_invoke();
        for id in session_ids {
            invocation.key(self.session_key(id));
        }
        invocation.arg(self.index_prefix()).arg(self.jti_prefix());

        let removed: u64 = self
            .client
            .with_deadline("delete sessions", invocation.invoke_async(&mut conn))
            .await?;
        Ok(removed)
    }

    async fn sweep_user_index(&self, user_id: UserId) -> AppResult<u64> {
        self.prune_index(&self.index_key(user_id)).await
    }

    async fn sweep_all(&self) -> AppResult<u64> {
        let pattern = self.client.prefixed_key(keys::user_sessions_pattern());
        let mut conn = self.client.conn_mut();
        let mut cursor: u64 = 0;
        let mut removed = 0;

        loop {
            let (next, page): (u64, Vec<String>) = self
                .client
                .with_deadline(
                    "SCAN",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_COUNT)
                        .query_async(&mut conn),
                )
                .await?;

            for index_key in &page {
                match self.prune_index(index_key).await {
                    Ok(n) => removed += n,
                    Err(e) => warn!(key = %index_key, error = %e, "Failed to prune session index"),
                }
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }
}

/// Decode a session hash. Corrupt records are skipped with a warning.
fn parse_session(context: &str, fields: &HashMap<String, String>) -> Option<Session> {
    let parsed = (|| {
        Some(Session {
            id: fields.get("id")?.clone(),
            user_id: fields.get("user_id")?.parse().ok()?,
            device: fields.get("device").cloned().unwrap_or_default(),
            ip: fields.get("ip").cloned().unwrap_or_default(),
            current_jti: fields.get("current_jti")?.clone(),
            created_at: parse_timestamp(fields.get("created_at")?)?,
            updated_at: parse_timestamp(fields.get("updated_at")?)?,
            expires_at: parse_timestamp(fields.get("expires_at")?)?,
        })
    })();

    if parsed.is_none() {
        warn!(key = %context, "Skipping malformed session record");
    }
    parsed
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(raw.parse().ok()?, 0)
}
