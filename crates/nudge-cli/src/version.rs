pub const FULL: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "+git.",
    env!("NUDGE_GIT_COUNT"),
    ".",
    env!("NUDGE_GIT_SHA"),
    env!("NUDGE_GIT_DIRTY")
);
