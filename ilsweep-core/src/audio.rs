use jack::PortFlags;
use thiserror::Error;

use std::sync::mpsc::{sync_channel, Receiver, SendError, SyncSender};

use crate::{controller::PlaybackPort, volume_to_amplitude};

#[derive(Error, Debug)]
pub enum AudioBackendError {
    #[error("audio backend stopped")]
    Stopped,
    #[error("audio backend failed")]
    Other,
}

impl From<jack::Error> for AudioBackendError {
    fn from(_err: jack::Error) -> Self {
        Self::Other
    }
}

impl From<SendError<Message>> for AudioBackendError {
    fn from(_err: SendError<Message>) -> Self {
        Self::Stopped
    }
}

enum Message {
    RegisterOutPort(jack::Port<jack::AudioOut>),
    PlayBuffer {
        samples: std::vec::IntoIter<f32>,
        respond_to: SyncSender<bool>,
    },
}

pub struct ProcessHandler {
    respond_to: Option<SyncSender<bool>>,
    cur_buffer: Option<std::vec::IntoIter<f32>>,
    out_port: Option<jack::Port<jack::AudioOut>>,
    msg_rx: Receiver<Message>,
}

impl jack::ProcessHandler for ProcessHandler {
    fn process(&mut self, _: &jack::Client, process_scope: &jack::ProcessScope) -> jack::Control {
        let mut buffer_ended = false;

        if let (Some(out), Some(samples)) = (&mut self.out_port, &mut self.cur_buffer) {
            let out = out.as_mut_slice(process_scope);

            for o in out.iter_mut() {
                if let Some(sample) = samples.next() {
                    *o = sample;
                } else {
                    *o = 0.0f32;
                    buffer_ended = true;
                }
            }
        };

        if buffer_ended {
            if let Some(respond_to) = self.respond_to.take() {
                let _ = respond_to.try_send(true);
            }
            self.cur_buffer = None;
        }

        if let Ok(msg) = self.msg_rx.try_recv() {
            match msg {
                Message::RegisterOutPort(p) => self.out_port = Some(p),
                Message::PlayBuffer { samples, respond_to } => {
                    self.respond_to = Some(respond_to);
                    self.cur_buffer = Some(samples);
                }
            }
        }

        jack::Control::Continue
    }
}

/// Plays 16 bit mono buffers through a jack output port.
pub struct AudioEngine {
    client: jack::AsyncClient<(), ProcessHandler>,
    msg_tx: SyncSender<Message>,
    amplitude: f32,
}

impl AudioEngine {
    pub fn new(name: &str) -> Result<Self, AudioBackendError> {
        let (client, _status) = jack::Client::new(name, jack::ClientOptions::NO_START_SERVER)?;

        let (msg_tx, msg_rx) = sync_channel(64);

        let process_handler = ProcessHandler {
            respond_to: None,
            out_port: None,
            cur_buffer: None,
            msg_rx,
        };

        let active_client = client.activate_async((), process_handler)?;

        Ok(Self {
            client: active_client,
            msg_tx,
            amplitude: volume_to_amplitude(0.5),
        })
    }

    pub fn register_out_port<T: AsRef<str>>(
        &self,
        port_name: &str,
        dest_ports: &[T],
    ) -> Result<(), AudioBackendError> {
        let out_port = self
            .client
            .as_client()
            .register_port(port_name, jack::AudioOut::default())?;

        let full_port_name = out_port.name()?;

        for dest_port in dest_ports {
            self.client
                .as_client()
                .connect_ports_by_name(&full_port_name, dest_port.as_ref())?;
        }

        self.msg_tx.send(Message::RegisterOutPort(out_port))?;

        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.client.as_client().sample_rate() as u32
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.amplitude = volume_to_amplitude(volume.clamp(0.0, 1.0));
    }

    pub fn out_ports(&self) -> Vec<String> {
        self.client
            .as_client()
            .ports(None, Some("32 bit float mono audio"), PortFlags::IS_INPUT)
    }
}

impl PlaybackPort for AudioEngine {
    fn play(&mut self, samples: &[i16]) -> Result<(), AudioBackendError> {
        let scale = self.amplitude / f32::from(i16::MAX);
        let samples: Vec<f32> = samples.iter().map(|&s| f32::from(s) * scale).collect();

        let (tx, rx) = sync_channel(1);
        self.msg_tx.send(Message::PlayBuffer {
            samples: samples.into_iter(),
            respond_to: tx,
        })?;

        rx.recv().map_err(|_| AudioBackendError::Stopped)?;

        Ok(())
    }
}
