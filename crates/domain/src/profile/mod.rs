mod device_object;
mod entity;
mod resource;

pub use device_object::{DeviceObject, ProfileProperty, PropertyValue, Units};
pub use entity::DeviceProfile;
pub use resource::{Command, Method, ProfileResource, ResourceOperation};
