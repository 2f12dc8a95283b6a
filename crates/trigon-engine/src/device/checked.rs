use std::sync::Arc;

/// Runs `f` inside a validation error scope on `device`.
///
/// Any validation error raised by wgpu calls made in `f` is captured instead of
/// reaching the uncaptured-error handler, logged at `error` with `what`, and
/// returned. The value produced by `f` is discarded on error; GPU objects created
/// in a failing scope are invalid.
pub fn checked<T>(
    device: &wgpu::Device,
    what: &str,
    f: impl FnOnce() -> T,
) -> Result<T, wgpu::Error> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();

    match pollster::block_on(scope.pop()) {
        None => Ok(value),
        Some(err) => {
            log::error!("wgpu validation error in {what}: {err}");
            Err(err)
        }
    }
}

/// Installs a handler that logs errors raised outside any [`checked`] scope.
///
/// Without it wgpu panics on the first uncaptured error.
pub(crate) fn log_uncaptured_errors(device: &wgpu::Device) {
    device.on_uncaptured_error(Arc::new(|err: wgpu::Error| {
        log::error!("uncaptured wgpu error: {err}");
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_device() -> (wgpu::Device, wgpu::Queue) {
        wgpu::Device::noop(&wgpu::DeviceDescriptor::default())
    }

    #[test]
    fn valid_calls_pass_through() {
        let (device, _queue) = noop_device();
        let buffer = checked(&device, "vertex buffer", || {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("ok"),
                size: 64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })
        .unwrap();
        assert_eq!(buffer.size(), 64);
    }

    #[test]
    fn validation_error_is_returned() {
        let (device, _queue) = noop_device();
        let err = checked(&device, "mappable vertex buffer", || {
            // MAP_READ may only be combined with COPY_DST.
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("bad"),
                size: 64,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::VERTEX,
                mapped_at_creation: false,
            })
        })
        .unwrap_err();
        assert!(matches!(err, wgpu::Error::Validation { .. }));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn uncaptured_errors_are_logged_not_raised() {
        let (device, _queue) = noop_device();
        log_uncaptured_errors(&device);

        // Outside any scope; with the default handler this would panic.
        let _ = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bad"),
            size: 64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::VERTEX,
            mapped_at_creation: false,
        });
    }

    #[test]
    fn scopes_nest_independently() {
        let (device, _queue) = noop_device();
        let outer = checked(&device, "outer", || {
            checked(&device, "inner", || {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("bad"),
                    size: 64,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::VERTEX,
                    mapped_at_creation: false,
                })
            })
            .is_err()
        });
        assert_eq!(outer.ok(), Some(true));
    }
}
