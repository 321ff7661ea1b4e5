use std::collections::{BTreeSet, HashMap};

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use crate::{
    error::AppResult,
    models::{MovieId, MovieTally, Polarity, UserId},
    store::ReactionStore,
};

/// Moves a pair onto the requested polarity.
///
/// KEYS: own user set, own movie set, own counter hash,
///       opposite user set, opposite movie set, opposite counter hash
/// ARGV: user id, movie id
const SET_REACTION_SCRIPT: &str = r#"
local changed = 0
if redis.call('SREM', KEYS[4], ARGV[2]) == 1 then
  redis.call('SREM', KEYS[5], ARGV[1])
  if redis.call('HINCRBY', KEYS[6], ARGV[2], -1) <= 0 then
    redis.call('HDEL', KEYS[6], ARGV[2])
  end
  changed = 1
end
if redis.call('SADD', KEYS[1], ARGV[2]) == 1 then
  redis.call('SADD', KEYS[2], ARGV[1])
  redis.call('HINCRBY', KEYS[3], ARGV[2], 1)
  changed = 1
end
return changed
"#;

/// Removes a pair's polarity if it is the active one.
///
/// KEYS: user set, movie set, counter hash
/// ARGV: user id, movie id
const CLEAR_REACTION_SCRIPT: &str = r#"
if redis.call('SREM', KEYS[1], ARGV[2]) == 1 then
  redis.call('SREM', KEYS[2], ARGV[1])
  if redis.call('HINCRBY', KEYS[3], ARGV[2], -1) <= 0 then
    redis.call('HDEL', KEYS[3], ARGV[2])
  end
  return 1
end
return 0
"#;

/// Key layout of the reaction indices under one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionKeys {
    namespace: String,
}

impl ReactionKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Set of movies a user holds `polarity` on
    pub fn user_movies(&self, user_id: &str, polarity: Polarity) -> String {
        format!("{}:user:{}:{}", self.namespace, user_id, polarity)
    }

    /// Set of users holding `polarity` on a movie
    pub fn movie_users(&self, movie_id: &str, polarity: Polarity) -> String {
        format!("{}:movie:{}:{}", self.namespace, movie_id, polarity)
    }

    /// Hash of movie id -> number of users holding `polarity`
    pub fn counters(&self, polarity: Polarity) -> String {
        match polarity {
            Polarity::Like => format!("{}:like_counts", self.namespace),
            Polarity::Dislike => format!("{}:dislike_counts", self.namespace),
        }
    }
}

/// Reaction store backed by Redis sets
///
/// Each mutation runs as one Lua script, so Redis applies the set and counter
/// changes for a pair atomically and concurrent writers are serialized by the
/// server; the last script to run wins.
#[derive(Clone)]
pub struct RedisReactionStore {
    conn: ConnectionManager,
    keys: ReactionKeys,
    set_script: Script,
    clear_script: Script,
}

impl RedisReactionStore {
    pub fn new(conn: ConnectionManager, namespace: impl Into<String>) -> Self {
        Self {
            conn,
            keys: ReactionKeys::new(namespace),
            set_script: Script::new(SET_REACTION_SCRIPT),
            clear_script: Script::new(CLEAR_REACTION_SCRIPT),
        }
    }
}

#[async_trait::async_trait]
impl ReactionStore for RedisReactionStore {
    async fn set_reaction(
        &self,
        user_id: &str,
        movie_id: &str,
        polarity: Polarity,
    ) -> AppResult<bool> {
        let opposite = polarity.opposite();
        let mut conn = self.conn.clone();

        let changed: i64 = self
            .set_script
            .key(self.keys.user_movies(user_id, polarity))
            .key(self.keys.movie_users(movie_id, polarity))
            .key(self.keys.counters(polarity))
            .key(self.keys.user_movies(user_id, opposite))
            .key(self.keys.movie_users(movie_id, opposite))
            .key(self.keys.counters(opposite))
            .arg(user_id)
            .arg(movie_id)
            .invoke_async(&mut conn)
            .await?;

        Ok(changed == 1)
    }

    async fn clear_reaction(
        &self,
        user_id: &str,
        movie_id: &str,
        polarity: Polarity,
    ) -> AppResult<bool> {
        let mut conn = self.conn.clone();

        let changed: i64 = self
            .clear_script
            .key(self.keys.user_movies(user_id, polarity))
            .key(self.keys.movie_users(movie_id, polarity))
            .key(self.keys.counters(polarity))
            .arg(user_id)
            .arg(movie_id)
            .invoke_async(&mut conn)
            .await?;

        Ok(changed == 1)
    }

    async fn movies_for(&self, user_id: &str, polarity: Polarity) -> AppResult<BTreeSet<MovieId>> {
        let mut conn = self.conn.clone();
        let movies: BTreeSet<MovieId> = conn.smembers(self.keys.user_movies(user_id, polarity)).await?;
        Ok(movies)
    }

    async fn users_for(&self, movie_id: &str, polarity: Polarity) -> AppResult<BTreeSet<UserId>> {
        let mut conn = self.conn.clone();
        let users: BTreeSet<UserId> = conn.smembers(self.keys.movie_users(movie_id, polarity)).await?;
        Ok(users)
    }

    async fn count_for(&self, movie_id: &str, polarity: Polarity) -> AppResult<u64> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.scard(self.keys.movie_users(movie_id, polarity)).await?;
        Ok(count)
    }

    async fn tallies(&self) -> AppResult<Vec<MovieTally>> {
        let mut conn = self.conn.clone();
        let (likes, dislikes): (HashMap<MovieId, u64>, HashMap<MovieId, u64>) = redis::pipe()
            .hgetall(self.keys.counters(Polarity::Like))
            .hgetall(self.keys.counters(Polarity::Dislike))
            .query_async(&mut conn)
            .await?;

        let movies: BTreeSet<&MovieId> = likes.keys().chain(dislikes.keys()).collect();
        let tallies = movies
            .into_iter()
            .map(|movie_id| MovieTally {
                movie_id: movie_id.clone(),
                likes: likes.get(movie_id).copied().unwrap_or_default(),
                dislikes: dislikes.get(movie_id).copied().unwrap_or_default(),
            })
            .filter(|tally| tally.likes + tally.dislikes > 0)
            .collect();

        Ok(tallies)
    }

    async fn all_watched_for(&self, user_id: &str) -> AppResult<BTreeSet<MovieId>> {
        let mut conn = self.conn.clone();
        let watched: BTreeSet<MovieId> = conn
            .sunion(vec![
                self.keys.user_movies(user_id, Polarity::Like),
                self.keys.user_movies(user_id, Polarity::Dislike),
            ])
            .await?;
        Ok(watched)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
