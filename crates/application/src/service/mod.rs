mod device_service;
mod settings;

pub use device_service::DeviceService;
pub use settings::ServiceSettings;
