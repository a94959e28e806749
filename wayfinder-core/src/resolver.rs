//! Default strategies for turning a walked file into a controller instance.

use tracing::debug;

use crate::controller::{ConstructOptions, ControllerClass, ControllerInstance, ControllerRegistry};
use crate::walker::FileInfo;

/// Look up the controller registered for the file's module key.
///
/// A file nothing was registered for yields `None` and is skipped.
pub fn get_class(registry: &ControllerRegistry, file: &FileInfo) -> Option<ControllerClass> {
    let module = file.module_key();
    let class = registry.class_for(&module).cloned();
    if class.is_none() {
        debug!(
            module = %module,
            file = %file.absolute_path.display(),
            "No controller registered for module, skipping"
        );
    }
    class
}

/// Construct the controller with the shared construct options.
pub fn instantiate(class: &ControllerClass, options: &ConstructOptions) -> Option<ControllerInstance> {
    class.construct(options)
}
