pub mod minimize;
pub mod tree;
pub mod window_node;
pub mod window_pair;

pub use minimize::{MinimizeList, MinimizeReason, MinimizeSink};
pub use tree::{DisplayGroupWindowTree, NodeId, Parent, RootBuckets, RootType, WindowTree};
pub use window_node::{
    DragType, ModeSupport, SizeLimits, SurfaceKind, SurfaceKinds, WindowFlags, WindowId,
    WindowMode, WindowNode, WindowSizeChangeReason, WindowType, WindowUpdateReason,
};
pub use window_pair::{PairContext, PairStatus, WindowPair};
