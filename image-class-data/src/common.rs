pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use futures::future::{self, BoxFuture, FutureExt as _};
pub use indexmap::IndexSet;
pub use itertools::Itertools as _;
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::HashSet,
    fmt::{self, Debug},
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
pub use tracing::{debug, info, info_span, trace, warn, Instrument as _};
