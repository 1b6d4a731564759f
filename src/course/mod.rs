/*!
 * Course tree model.
 *
 * - `version`: `vNNN` parsing, ordering and increment
 * - `layout`: course/language/version/chapter paths and skeleton copy
 * - `artifact`: the single per-slide filename schema
 * - `change`: content-hash comparison against the previous version
 * - `metadata`: `course.yml`
 */

pub mod artifact;
pub mod change;
pub mod layout;
pub mod metadata;
pub mod version;

pub use self::artifact::{ArtifactKind, ArtifactName, SlideIndex};
pub use self::change::{ChangeDetector, ChangeRecord};
pub use self::layout::{Chapter, CourseLayout, VersionPolicy, SLIDES_DIR};
pub use self::metadata::CourseMetadata;
pub use self::version::{latest_version, next_version, Version};
