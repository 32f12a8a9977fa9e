use rand::seq::SliceRandom;

use crate::models::SubType;

/// Header artwork assigned to new profiles, one pool per partner kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderImagePool {
    pub home_service: Vec<String>,
    pub place: Vec<String>,
}

impl Default for HeaderImagePool {
    fn default() -> Self {
        let pool = |prefix: &str| {
            (1..=5)
                .map(|i| format!("/assets/headers/{prefix}_{i}.png"))
                .collect::<Vec<_>>()
        };
        Self {
            home_service: pool("home_service"),
            place: pool("place"),
        }
    }
}

impl HeaderImagePool {
    pub fn for_kind(&self, sub_type: SubType) -> &[String] {
        match sub_type {
            SubType::HomeService => &self.home_service,
            SubType::Place => &self.place,
        }
    }

    /// `pool[existing mod len]`, so consecutive sign-ups rotate through the pool.
    pub fn select(&self, sub_type: SubType, existing: u64) -> Option<&str> {
        let pool = self.for_kind(sub_type);
        if pool.is_empty() {
            return None;
        }
        let index = (existing % pool.len() as u64) as usize;
        Some(pool[index].as_str())
    }

    pub fn random(&self, sub_type: SubType) -> Option<&str> {
        self.for_kind(sub_type)
            .choose(&mut rand::thread_rng())
            .map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> HeaderImagePool {
        HeaderImagePool {
            home_service: vec!["a".into(), "b".into(), "c".into()],
            place: vec!["p".into()],
        }
    }

    #[test]
    fn test_select_cycles_through_pool() {
        let pool = pool();
        let picks: Vec<_> = (0..7)
            .map(|n| pool.select(SubType::HomeService, n).unwrap())
            .collect();
        assert_eq!(picks, vec!["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn test_select_is_stable_for_same_count() {
        let pool = pool();
        assert_eq!(
            pool.select(SubType::HomeService, 41),
            pool.select(SubType::HomeService, 41)
        );
        assert_eq!(pool.select(SubType::Place, 41), Some("p"));
    }

    #[test]
    fn test_empty_pool_selects_nothing() {
        let pool = HeaderImagePool {
            home_service: vec![],
            place: vec![],
        };
        assert_eq!(pool.select(SubType::Place, 3), None);
        assert_eq!(pool.random(SubType::Place), None);
    }

    #[test]
    fn test_random_pick_comes_from_pool() {
        let pool = pool();
        let pick = pool.random(SubType::HomeService).unwrap();
        assert!(pool.home_service.iter().any(|s| s == pick));
    }
}
