pub mod memcpu;
pub mod runtime;

pub use memcpu::MemCpuSampler;
pub use runtime::RuntimeSampler;
