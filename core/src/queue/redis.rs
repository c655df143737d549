// core/src/queue/redis.rs

//! Redis list queue: producers `LPUSH`, consumers `BRPOP`.
//!
//! A blocking pop holds its connection server-side for the whole wait, so pops
//! never share the multiplexed push connection. Each pop checks out a
//! dedicated connection from a small idle pool and returns it afterwards.
//! Connections that saw an error are discarded instead of returned.

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tracing::{event, instrument, Level};

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::CheckoutJob;
use crate::queue::{JobQueue, DEFAULT_QUEUE_KEY};

/// BRPOP treats 0 as "block forever"; never send less than this.
const MIN_BLOCK_SECS: f64 = 0.01;

pub struct RedisJobQueue {
  client: Client,
  conn_manager: ConnectionManager,
  key: String,
  idle_pop_conns: Mutex<Vec<MultiplexedConnection>>,
}

impl std::fmt::Debug for RedisJobQueue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RedisJobQueue")
      .field("key", &self.key)
      .field("idle_pop_conns", &self.idle_pop_conns.lock().len())
      .finish_non_exhaustive()
  }
}

impl RedisJobQueue {
  pub async fn connect(redis_url: &str) -> CheckoutResult<Self> {
    Self::connect_with_key(redis_url, DEFAULT_QUEUE_KEY).await
  }

  pub async fn connect_with_key(redis_url: &str, key: impl Into<String>) -> CheckoutResult<Self> {
    let client = Client::open(redis_url)?;
    let conn_manager = ConnectionManager::new(client.clone()).await?;
    let key = key.into();
    event!(Level::INFO, queue_key = %key, "Connected checkout queue to Redis.");
    Ok(Self {
      client,
      conn_manager,
      key,
      idle_pop_conns: Mutex::new(Vec::new()),
    })
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub async fn ping(&self) -> CheckoutResult<()> {
    let mut conn = self.conn_manager.clone();
    let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
    if pong != "PONG" {
      return Err(CheckoutError::infrastructure(
        "job queue",
        anyhow::anyhow!("unexpected PING reply '{}'", pong),
      ));
    }
    Ok(())
  }

  async fn checkout_pop_conn(&self) -> CheckoutResult<MultiplexedConnection> {
    let idle = self.idle_pop_conns.lock().pop();
    match idle {
      Some(conn) => Ok(conn),
      None => Ok(self.client.get_multiplexed_async_connection().await?),
    }
  }

  fn return_pop_conn(&self, conn: MultiplexedConnection) {
    self.idle_pop_conns.lock().push(conn);
  }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
  #[instrument(name = "RedisJobQueue::push", skip(self, job), fields(job_id = %job.job_id), err(Display))]
  async fn push(&self, job: &CheckoutJob) -> CheckoutResult<()> {
    let payload = job.encode()?;
    let mut conn = self.conn_manager.clone();
    let _: i64 = conn.lpush(&self.key, payload).await?;
    Ok(())
  }

  async fn pop(&self, timeout: Duration) -> CheckoutResult<Option<CheckoutJob>> {
    let mut conn = self.checkout_pop_conn().await?;
    let block_secs = timeout.as_secs_f64().max(MIN_BLOCK_SECS);
    let reply: Option<(String, Vec<u8>)> = conn.brpop(&self.key, block_secs).await?;
    self.return_pop_conn(conn);

    let Some((_, payload)) = reply else {
      return Ok(None);
    };
    match CheckoutJob::decode(&payload) {
      Ok(job) => Ok(Some(job)),
      Err(e) => {
        event!(Level::WARN, queue_key = %self.key, error = %e, "Dropping undecodable job payload.");
        Err(e)
      }
    }
  }

  async fn len(&self) -> CheckoutResult<u64> {
    let mut conn = self.conn_manager.clone();
    let len: u64 = conn.llen(&self.key).await?;
    Ok(len)
  }
}
