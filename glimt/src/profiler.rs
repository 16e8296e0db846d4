use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;

/// Per-stage GPU timing via timestamp queries, recorded asynchronously and
/// resolved at frame boundaries; degrades to a no-op when the device lacks
/// `TIMESTAMP_QUERY`.
#[derive(Debug)]
pub struct FrameProfiler {
    inner: Option<ProfilerInner>,
}

#[derive(Debug)]
struct ProfilerInner {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,
    period_ns: f32,
    labels: Vec<&'static str>,
    pending: Option<mpsc::Receiver<Vec<u64>>>,
    pending_labels: Vec<&'static str>,
    latest: VecDeque<(&'static str, Duration)>,
}

const MAX_STAGES: u32 = 64;

impl FrameProfiler {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        if !device.features().contains(wgpu::Features::TIMESTAMP_QUERY) {
            log::info!("Timestamp queries unavailable; stage timing disabled");

            return Self { inner: None };
        }

        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("glimt_profiler"),
            ty: wgpu::QueryType::Timestamp,
            count: 2 * MAX_STAGES,
        });

        let size = (2 * MAX_STAGES as usize * 8) as u64;

        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glimt_profiler_resolve"),
            size,
            usage: wgpu::BufferUsages::QUERY_RESOLVE
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glimt_profiler_readback"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            inner: Some(ProfilerInner {
                query_set,
                resolve_buffer,
                readback_buffer,
                period_ns: queue.get_timestamp_period(),
                labels: Vec::new(),
                pending: None,
                pending_labels: Vec::new(),
                latest: VecDeque::new(),
            }),
        }
    }

    /// Claims a timestamp pair for the upcoming compute pass; `None` once
    /// the per-frame budget is spent or timing is disabled.
    pub fn stage(
        &mut self,
        label: &'static str,
    ) -> Option<wgpu::ComputePassTimestampWrites<'_>> {
        let inner = self.inner.as_mut()?;

        if inner.labels.len() as u32 >= MAX_STAGES {
            return None;
        }

        let slot = inner.labels.len() as u32;

        inner.labels.push(label);

        Some(wgpu::ComputePassTimestampWrites {
            query_set: &inner.query_set,
            beginning_of_pass_write_index: Some(2 * slot),
            end_of_pass_write_index: Some(2 * slot + 1),
        })
    }

    /// Resolves this frame's timestamps into the readback buffer; call after
    /// the last pass of the frame, still inside the encoder.
    pub fn resolve(&mut self, encoder: &mut wgpu::CommandEncoder) {
        let Some(inner) = &mut self.inner else {
            return;
        };

        let queries = 2 * inner.labels.len() as u32;

        if queries == 0 || inner.pending.is_some() {
            inner.labels.clear();
            return;
        }

        encoder.resolve_query_set(
            &inner.query_set,
            0..queries,
            &inner.resolve_buffer,
            0,
        );

        encoder.copy_buffer_to_buffer(
            &inner.resolve_buffer,
            0,
            &inner.readback_buffer,
            0,
            queries as u64 * 8,
        );

        inner.pending_labels = std::mem::take(&mut inner.labels);
    }

    /// Kicks off (or completes) the asynchronous readback; returns the most
    /// recently completed frame's timings, oldest stage first.
    pub fn report(
        &mut self,
        device: &wgpu::Device,
    ) -> Vec<(&'static str, Duration)> {
        let Some(inner) = &mut self.inner else {
            return Vec::new();
        };

        device.poll(wgpu::Maintain::Poll);

        if let Some(receiver) = &inner.pending {
            if let Ok(timestamps) = receiver.try_recv() {
                inner.latest = inner
                    .pending_labels
                    .iter()
                    .enumerate()
                    .map(|(slot, label)| {
                        let begin = timestamps[2 * slot];
                        let end = timestamps[2 * slot + 1];

                        let nanos = end.saturating_sub(begin) as f32
                            * inner.period_ns;

                        (*label, Duration::from_nanos(nanos as u64))
                    })
                    .collect();

                inner.readback_buffer.unmap();
                inner.pending = None;
            }
        } else if !inner.pending_labels.is_empty() {
            let (sender, receiver) = mpsc::channel();
            let slice = inner.readback_buffer.slice(..);

            let buffer = inner.readback_buffer.clone();

            slice.map_async(wgpu::MapMode::Read, move |result| {
                if result.is_ok() {
                    let data = buffer.slice(..).get_mapped_range();

                    let _ =
                        sender.send(bytemuck::pod_collect_to_vec(&data[..]));
                }
            });

            inner.pending = Some(receiver);
        }

        inner.latest.iter().copied().collect()
    }
}
