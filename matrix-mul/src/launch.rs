//! The launch environment that tells a process its place in a hybrid run.

use crate::Error;

pub const RANK_VAR: &str = "MATMUL_RANK";
pub const WORLD_SIZE_VAR: &str = "MATMUL_WORLD_SIZE";
pub const COORDINATOR_ADDR_VAR: &str = "MATMUL_COORDINATOR_ADDR";
pub const NUM_THREADS_VAR: &str = "MATMUL_NUM_THREADS";

pub const DEFAULT_COORDINATOR_ADDR: &str = "127.0.0.1:50051";

/// Rank, group size and rendezvous address of this process.
///
/// Unset variables fall back to a single-rank run: rank 0 of 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchEnv {
    pub rank: usize,
    pub world_size: usize,
    pub coordinator_addr: String,
}

impl LaunchEnv {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the launch variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let rank = parse_var(RANK_VAR, lookup(RANK_VAR), 0)?;
        let world_size = parse_var(WORLD_SIZE_VAR, lookup(WORLD_SIZE_VAR), 1)?;
        if world_size == 0 {
            return Err(Error::InvalidLaunchEnv {
                name: WORLD_SIZE_VAR,
                value: world_size.to_string(),
                reason: "must be at least 1",
            });
        }
        if rank >= world_size {
            return Err(Error::InvalidLaunchEnv {
                name: RANK_VAR,
                value: rank.to_string(),
                reason: "must be below the world size",
            });
        }

        let coordinator_addr = lookup(COORDINATOR_ADDR_VAR)
            .filter(|addr| !addr.is_empty())
            .unwrap_or_else(|| DEFAULT_COORDINATOR_ADDR.to_string());

        Ok(Self {
            rank,
            world_size,
            coordinator_addr,
        })
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == 0
    }

    /// The variables to set on a child process so it reads back `self`.
    pub fn vars(&self) -> [(&'static str, String); 3] {
        [
            (RANK_VAR, self.rank.to_string()),
            (WORLD_SIZE_VAR, self.world_size.to_string()),
            (COORDINATOR_ADDR_VAR, self.coordinator_addr.clone()),
        ]
    }
}

fn parse_var(name: &'static str, value: Option<String>, default: usize) -> Result<usize, Error> {
    match value {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| Error::InvalidLaunchEnv {
            name,
            value,
            reason: "not a non-negative integer",
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let env = LaunchEnv::from_lookup(lookup(&[])).unwrap();
        assert_eq!(
            env,
            LaunchEnv {
                rank: 0,
                world_size: 1,
                coordinator_addr: DEFAULT_COORDINATOR_ADDR.to_string(),
            }
        );
        assert!(env.is_coordinator());
    }

    #[test]
    fn test_vars_round_trip() {
        let env = LaunchEnv {
            rank: 2,
            world_size: 4,
            coordinator_addr: "10.0.0.1:7000".to_string(),
        };
        let vars = env.vars();
        let pairs: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();

        assert_eq!(LaunchEnv::from_lookup(lookup(&pairs)).unwrap(), env);
    }

    #[test]
    fn test_invalid_values() {
        let err = LaunchEnv::from_lookup(lookup(&[(RANK_VAR, "two")])).unwrap_err();
        assert!(matches!(err, Error::InvalidLaunchEnv { name: RANK_VAR, .. }));

        let err = LaunchEnv::from_lookup(lookup(&[(RANK_VAR, "3"), (WORLD_SIZE_VAR, "3")])).unwrap_err();
        assert!(matches!(err, Error::InvalidLaunchEnv { name: RANK_VAR, .. }));

        let err = LaunchEnv::from_lookup(lookup(&[(WORLD_SIZE_VAR, "0")])).unwrap_err();
        assert!(matches!(err, Error::InvalidLaunchEnv { name: WORLD_SIZE_VAR, .. }));
    }
}
