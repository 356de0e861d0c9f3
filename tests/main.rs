use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use rocl::prelude::*;
use rocl::buffer::MapFlags;
use rocl::image::{ChannelOrder, ChannelType, Image, ImageDesc, ImageFormat, ImageType};
use rocl::program::BuildStatus;
use rocl::sampler::{AddressingMode, FilterMode, Sampler};

const ADD_KERNEL : &str = "__kernel void add (const int n, __global const int* lhs, __global const int* rhs, __global int* out) {
    int id = get_global_id(0);
    if (id < n) {
        out[id] = lhs[id] + rhs[id];
    }
}";

fn init () -> (Device, Context, CommandQueue) {
    let _ = env_logger::builder().is_test(true).try_init();

    let device = Device::first().expect("no OpenCL device available");
    let ctx = Context::new(None, core::slice::from_ref(&device)).unwrap();
    let queue = CommandQueue::new(&ctx, device, None).unwrap();
    (device, ctx, queue)
}

#[test]
fn enumerates_devices () {
    let _ = env_logger::builder().is_test(true).try_init();

    let platforms = Platform::all();
    assert!(!platforms.is_empty());
    println!("platform: {}", platforms[0].name().unwrap());

    let device = Device::first().expect("no OpenCL device available");
    let name = device.name().unwrap();
    assert!(!name.is_empty());
    println!("device: {name}");
}

#[test]
fn vector_add () {
    let (_, ctx, queue) = init();

    let lhs = Buffer::new(&ctx, MemFlags::READ_ONLY, &[1i32, 2, 3, 4, 5, 6, 7, 8, 9, 10]).unwrap();
    let rhs = Buffer::new(&ctx, MemFlags::READ_ONLY, &[10i32, 20, 30, 40, 50, 60, 70, 80, 90, 100]).unwrap();
    let out = unsafe { Buffer::<i32>::uninit(&ctx, 10, MemFlags::WRITE_ONLY).unwrap() };

    let program = Program::build_from_source(&ctx, ADD_KERNEL).unwrap();
    let mut kernel = Kernel::new(&program, "add").unwrap();

    kernel.set_arg(0, 10i32).unwrap();
    kernel.set_buffer_arg(1, &lhs).unwrap();
    kernel.set_buffer_arg(2, &rhs).unwrap();
    kernel.set_buffer_arg(3, &out).unwrap();

    let run = kernel.enqueue(&queue, &[10], None, None, []).unwrap();
    let read = out.to_vec(&queue, [&run]).unwrap();

    assert_eq!(read, vec![11, 22, 33, 44, 55, 66, 77, 88, 99, 110]);
    queue.finish().unwrap();
}

#[test]
fn buffer_size_matches_request () {
    let (_, ctx, queue) = init();

    let buffer = Buffer::new(&ctx, None, &[0u64; 128]).unwrap();
    assert_eq!(buffer.size().unwrap(), 128 * core::mem::size_of::<u64>());
    assert_eq!(buffer.len().unwrap(), 128);
    assert_eq!(buffer.offset().unwrap(), 0);

    let sub = buffer.sub_buffer(None, 16, 32).unwrap();
    assert_eq!(sub.len().unwrap(), 32);
    assert_eq!(sub.offset().unwrap(), 16 * core::mem::size_of::<u64>());

    queue.finish().unwrap();
}

#[test]
fn fill_and_map_round_trip () {
    let (_, ctx, queue) = init();

    let mut buffer = Buffer::new(&ctx, None, &[0i32; 64]).unwrap();
    let fill = buffer.fill(&queue, 7, 8, 16, []).unwrap();
    fill.wait().unwrap();

    let map = buffer.map_blocking(&queue, MapFlags::READ, 8, 16, []).unwrap();
    assert!(map.iter().all(|&x| x == 7));
    map.unmap().unwrap();

    let head = buffer.read(&queue, 0, 8, []).unwrap();
    assert!(head.iter().all(|&x| x == 0));
}

#[test]
fn program_source_round_trips () {
    let (_, ctx, _) = init();

    let program = Program::from_source(&ctx, ADD_KERNEL).unwrap();
    assert_eq!(program.source().unwrap(), ADD_KERNEL);

    program.build(None, None).unwrap();
    let kernels = Kernel::all_in_program(&program).unwrap();
    assert_eq!(kernels.len(), 1);
    assert_eq!(kernels[0].function_name().unwrap(), "add");
}

#[test]
fn retain_release_identity () {
    let (_, ctx, _) = init();

    let buffer = Buffer::new(&ctx, None, &[1u8, 2, 3]).unwrap();
    let before = buffer.reference_count().unwrap();

    let other = buffer.clone();
    assert_eq!(buffer.reference_count().unwrap(), before + 1);

    drop(other);
    assert_eq!(buffer.reference_count().unwrap(), before);
}

#[test]
fn user_event_callback_fires_once () {
    let (_, ctx, _) = init();

    let hub = CallbackHub::new();
    let user = UserEvent::new(&ctx).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));

    let handle = fired.clone();
    user.on_complete(&hub, move |status| {
        assert_eq!(status.unwrap(), EventStatus::Complete);
        handle.fetch_add(1, Ordering::SeqCst);
    }).unwrap();

    assert_eq!(fired.load(Ordering::SeqCst), 0);
    user.complete().unwrap();

    let drained = hub.wait_timeout(Duration::from_secs(5));
    assert_eq!(drained, 1);
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    assert_eq!(hub.drain(), 0);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn build_with_notify_reports_through_hub () {
    let (_, ctx, _) = init();

    let hub = CallbackHub::new();
    let program = Program::from_source(&ctx, ADD_KERNEL).unwrap();
    let built = Arc::new(AtomicUsize::new(0));

    let handle = built.clone();
    program.build_with_notify(None, None, &hub, move |p| {
        let device = p.devices().unwrap()[0];
        assert_eq!(p.build_status(device).unwrap(), BuildStatus::Success);
        handle.fetch_add(1, Ordering::SeqCst);
    }).unwrap();

    assert_eq!(hub.wait_timeout(Duration::from_secs(30)), 1);
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn image_region_round_trips () {
    let (device, ctx, queue) = init();
    if !device.image_support().unwrap() {
        return;
    }

    // RGBA/u8 is in the 1.2 minimum format list for image-capable devices.
    let format = ImageFormat::new(ChannelOrder::RGBA, ChannelType::UnsignedInt8);
    let formats = Image::supported_formats(&ctx, MemFlags::READ_WRITE, ImageType::Image2D).unwrap();
    assert!(formats.contains(&format));

    let mut image = Image::new(&ctx, None, format, ImageDesc::new_2d(4, 4)).unwrap();
    assert_eq!(image.width().unwrap(), 4);
    assert_eq!(image.height().unwrap(), 4);
    assert_eq!(image.element_size().unwrap(), 4);
    assert_eq!(image.format().unwrap(), format);

    let pixels = (0..64u8).collect::<Vec<_>>();
    image.write(&queue, [0, 0, 0], [4, 4, 1], &pixels, []).unwrap();

    let mut read = vec![0u8; 64];
    image.read(&queue, [0, 0, 0], [4, 4, 1], &mut read, []).unwrap();
    assert_eq!(read, pixels);

    // A 2x2 window out of the middle.
    let mut window = vec![0u8; 16];
    image.read(&queue, [1, 1, 0], [2, 2, 1], &mut window, []).unwrap();
    assert_eq!(&window[..4], &pixels[20..24]);
}

#[test]
fn sampler_info_round_trips () {
    let (device, ctx, _) = init();
    if !device.image_support().unwrap() {
        return;
    }

    let sampler = Sampler::new(&ctx, true, AddressingMode::Clamp, FilterMode::Nearest).unwrap();
    assert!(sampler.normalized_coords().unwrap());
    assert_eq!(sampler.addressing_mode().unwrap(), AddressingMode::Clamp);
    assert_eq!(sampler.filter_mode().unwrap(), FilterMode::Nearest);

    let before = sampler.reference_count().unwrap();
    let other = sampler.clone();
    assert_eq!(sampler.reference_count().unwrap(), before + 1);
    drop(other);
    assert_eq!(sampler.reference_count().unwrap(), before);
}

#[test]
fn queue_markers_complete () {
    let (_, ctx, queue) = init();

    let mut buffer = Buffer::new(&ctx, None, &[0f32; 16]).unwrap();
    let fill = buffer.fill(&queue, 1.5, 0, 16, []).unwrap();

    let marker = queue.marker([&fill]).unwrap();
    marker.wait().unwrap();
    assert_eq!(marker.status().unwrap(), EventStatus::Complete);

    let read = buffer.to_vec(&queue, []).unwrap();
    assert!(read.iter().all(|&x| x == 1.5));
}

#[test]
#[should_panic]
fn out_of_bounds_read_panics () {
    let (_, ctx, queue) = init();

    let buffer = Buffer::new(&ctx, None, &[0u32; 4]).unwrap();
    let _ = buffer.read(&queue, 2, 4, []);
}
