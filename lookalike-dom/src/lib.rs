//! Markup normalization for page comparison.
//!
//! Raw HTML goes through three stages here:
//!
//! 1. [`page::PageDom`] parses it with `scraper`, removes unwanted tags and
//!    collects stylesheets ([`stylesheet::StyleSheetMap`]).
//! 2. The page is converted to an owned [`generic::GenericDom`], optionally
//!    with stylesheet properties projected onto matching elements.
//! 3. [`builder::TreeBuilder`] reduces that DOM to a deduplicated
//!    [`tree::NormalizedTree`], the input of every feature extractor.
//!
//! ```
//! use lookalike_dom::{PageDom, TreeBuilder};
//!
//! let page = PageDom::parse("<ul><li>a</li><li>b</li></ul>");
//! let dom = page.to_generic(None);
//! let mut tree = TreeBuilder::new().build(&dom);
//!
//! // html, head, body, ul and a single li survive sibling dedup.
//! assert_eq!(tree.preorder_list().len(), 5);
//! ```

pub mod builder;
pub mod generic;
pub mod page;
pub mod preprocess;
pub mod stylesheet;
pub mod tree;

pub use builder::{compute_node_key, NodeKey, TreeBuilder};
pub use generic::{GenericDom, GenericElement};
pub use page::PageDom;
pub use preprocess::{extract_stylesheets, prepare_page, PreparedPage, PreprocessOptions};
pub use stylesheet::{parse_stylesheet, Declarations, StyleSheetMap};
pub use tree::{NodeId, NormalizedTree, TreeNode, ROOT, ROOT_TAG};
