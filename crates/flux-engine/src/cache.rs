//! Once-per-process cache clearing

use crate::provider::ProviderRegistry;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Cache clear command as issued by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCommand {
    All,
    Pages,
    System,
    /// Caches of a single page
    Page(u64),
    Other(String),
}

impl CacheCommand {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "all" => CacheCommand::All,
            "pages" => CacheCommand::Pages,
            "system" => CacheCommand::System,
            other => match other.parse::<u64>() {
                Ok(page) => CacheCommand::Page(page),
                Err(_) => CacheCommand::Other(other.to_string()),
            },
        }
    }
}

impl fmt::Display for CacheCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheCommand::All => f.write_str("all"),
            CacheCommand::Pages => f.write_str("pages"),
            CacheCommand::System => f.write_str("system"),
            CacheCommand::Page(page) => write!(f, "{}", page),
            CacheCommand::Other(raw) => f.write_str(raw),
        }
    }
}

/// Fans a cache clear out to every provider, once
///
/// Owned by whatever composes the hooks, usually one per process. The
/// host fires the clear-cache event several times per request; only the
/// first one reaches the providers.
#[derive(Debug, Default)]
pub struct CacheSweep {
    cleared: AtomicBool,
}

impl CacheSweep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every provider of every table to clear its cache
    ///
    /// Returns the number of providers asked, or `None` if the sweep
    /// already ran. Provider failures are logged and do not stop the sweep.
    pub fn clear<R: ProviderRegistry + ?Sized>(
        &self,
        registry: &R,
        command: &CacheCommand,
    ) -> Option<usize> {
        if self
            .cleared
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(%command, "caches already cleared");
            return None;
        }

        let mut asked = 0;
        for table in registry.tables() {
            for provider in registry.resolve(&table, None) {
                asked += 1;
                if let Err(error) = provider.clear_cache(command) {
                    warn!(provider = provider.name(), %table, %error, "cache clear failed");
                }
            }
        }
        debug!(%command, providers = asked, "caches cleared");
        Some(asked)
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ConfigurationProvider, ProviderError, ProviderResult, ProviderSet};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct Counting {
        name: &'static str,
        clears: AtomicUsize,
        fail: bool,
    }

    impl Counting {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                clears: AtomicUsize::new(0),
                fail,
            })
        }
    }

    impl ConfigurationProvider for Counting {
        fn name(&self) -> &str {
            self.name
        }

        fn clear_cache(&self, _command: &CacheCommand) -> ProviderResult<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Failed("cache dir not writable".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(CacheCommand::parse("all"), CacheCommand::All);
        assert_eq!(CacheCommand::parse("12"), CacheCommand::Page(12));
        assert_eq!(
            CacheCommand::parse("temp_cached"),
            CacheCommand::Other("temp_cached".into())
        );
        assert_eq!(CacheCommand::parse("pages").to_string(), "pages");
    }

    #[test]
    fn test_second_sweep_is_a_no_op() {
        let content = Counting::new("content", false);
        let pages = Counting::new("pages", false);
        let mut set = ProviderSet::new("CType");
        set.register("tt_content", content.clone());
        set.register("pages", pages.clone());

        let sweep = CacheSweep::new();
        assert!(!sweep.is_cleared());
        assert_eq!(sweep.clear(&set, &CacheCommand::All), Some(2));
        assert!(sweep.is_cleared());
        assert_eq!(sweep.clear(&set, &CacheCommand::All), None);

        assert_eq!(content.clears.load(Ordering::SeqCst), 1);
        assert_eq!(pages.clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_provider_does_not_stop_sweep() {
        let broken = Counting::new("broken", true);
        let fine = Counting::new("fine", false);
        let mut set = ProviderSet::new("CType");
        set.register("tt_content", broken.clone());
        set.register("tt_content", fine.clone());

        let sweep = CacheSweep::new();
        assert_eq!(sweep.clear(&set, &CacheCommand::System), Some(2));
        assert_eq!(fine.clears.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_separate_sweeps_are_independent() {
        let provider = Counting::new("content", false);
        let mut set = ProviderSet::new("CType");
        set.register("tt_content", provider.clone());

        CacheSweep::new().clear(&set, &CacheCommand::All);
        CacheSweep::new().clear(&set, &CacheCommand::All);
        assert_eq!(provider.clears.load(Ordering::SeqCst), 2);
    }
}
