//! Robot persistence port.
//!
//! The scheduling core never touches a database directly; it consumes the
//! store as exactly the two operations spec'd: list all autonomous robots,
//! and fetch one robot by id. A durable implementation is an external
//! collaborator; `InMemoryRobotStore` below is the test/demo adapter the
//! core ships, mirroring the teacher's pattern of shipping a null/in-memory
//! adapter alongside every port it defines.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::error::RobotError;
use crate::domain::models::{Robot, RobotConfig};

/// Page size used by `RobotStore::load_autonomous` callers that paginate.
pub const LOAD_PAGE_SIZE: usize = 100;

/// Port the robot cache (C1) uses to hydrate itself.
#[async_trait]
pub trait RobotStore: Send + Sync {
    /// All robots with `autonomous_mode = true` and an active status,
    /// paginated by the caller in pages of at most `LOAD_PAGE_SIZE`.
    async fn load_autonomous(&self, offset: usize, limit: usize) -> Result<Vec<RobotRecord>, RobotError>;

    /// Single-robot fetch for the lazy-load slow path.
    async fn load_by_id(&self, member_id: &str) -> Result<RobotRecord, RobotError>;
}

/// A persistence-layer record the store hands back; the cache turns this
/// into a live `Robot`.
#[derive(Debug, Clone)]
pub struct RobotRecord {
    pub member_id: String,
    pub team_id: String,
    pub autonomous_mode: bool,
    pub config: RobotConfig,
}

impl RobotRecord {
    pub fn into_robot(self) -> Robot {
        let mut robot = Robot::new(self.member_id, self.team_id, self.config);
        if self.autonomous_mode {
            robot = robot.autonomous();
        }
        robot
    }
}

/// In-memory `RobotStore` adapter for tests and the demo binary.
#[derive(Default)]
pub struct InMemoryRobotStore {
    records: RwLock<HashMap<String, RobotRecord>>,
}

impl InMemoryRobotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: RobotRecord) {
        self.records
            .write()
            .expect("store mutex poisoned")
            .insert(record.member_id.clone(), record);
    }
}

#[async_trait]
impl RobotStore for InMemoryRobotStore {
    async fn load_autonomous(&self, offset: usize, limit: usize) -> Result<Vec<RobotRecord>, RobotError> {
        let records = self.records.read().expect("store mutex poisoned");
        let mut autonomous: Vec<RobotRecord> = records
            .values()
            .filter(|r| r.autonomous_mode)
            .cloned()
            .collect();
        autonomous.sort_by(|a, b| a.member_id.cmp(&b.member_id));
        Ok(autonomous.into_iter().skip(offset).take(limit).collect())
    }

    async fn load_by_id(&self, member_id: &str) -> Result<RobotRecord, RobotError> {
        self.records
            .read()
            .expect("store mutex poisoned")
            .get(member_id)
            .cloned()
            .ok_or_else(|| RobotError::NotFound(member_id.to_string()))
    }
}
