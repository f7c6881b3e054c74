//! In-process channel pair for two-participant tests.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tether_core::{Channel, ChannelError};

/// One typed message on the in-process wire.
#[derive(Clone, Debug)]
enum Frame {
    Int(i32),
    Scalar(f64),
    Bool(bool),
    Vector(Vec<f64>),
}

impl Frame {
    fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Scalar(_) => "scalar",
            Self::Bool(_) => "bool",
            Self::Vector(_) => "vector",
        }
    }
}

/// One endpoint of an in-process channel pair.
///
/// Receives block until the peer sends, which reproduces the distributed
/// blocking semantics of a real transport; sends never block (unbounded
/// queue). Run the two participants on separate threads.
pub struct InProcChannel {
    tx: Sender<Frame>,
    rx: Receiver<Frame>,
}

/// Create a connected pair of endpoints.
pub fn channel_pair() -> (InProcChannel, InProcChannel) {
    let (a_tx, a_rx) = unbounded();
    let (b_tx, b_rx) = unbounded();
    (
        InProcChannel { tx: a_tx, rx: b_rx },
        InProcChannel { tx: b_tx, rx: a_rx },
    )
}

impl InProcChannel {
    fn send(&mut self, frame: Frame) -> Result<(), ChannelError> {
        self.tx.send(frame).map_err(|_| ChannelError::Disconnected)
    }

    fn receive(&mut self, expected: &'static str) -> Result<Frame, ChannelError> {
        let frame = self.rx.recv().map_err(|_| ChannelError::Disconnected)?;
        if frame.kind() != expected {
            return Err(ChannelError::TypeMismatch {
                expected,
                found: frame.kind(),
            });
        }
        Ok(frame)
    }
}

impl Channel for InProcChannel {
    fn is_connected(&self) -> bool {
        true
    }

    fn send_int(&mut self, value: i32) -> Result<(), ChannelError> {
        self.send(Frame::Int(value))
    }

    fn send_scalar(&mut self, value: f64) -> Result<(), ChannelError> {
        self.send(Frame::Scalar(value))
    }

    fn send_bool(&mut self, value: bool) -> Result<(), ChannelError> {
        self.send(Frame::Bool(value))
    }

    fn send_vector(&mut self, values: &[f64]) -> Result<(), ChannelError> {
        self.send(Frame::Vector(values.to_vec()))
    }

    fn receive_int(&mut self) -> Result<i32, ChannelError> {
        match self.receive("int")? {
            Frame::Int(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    fn receive_scalar(&mut self) -> Result<f64, ChannelError> {
        match self.receive("scalar")? {
            Frame::Scalar(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    fn receive_bool(&mut self) -> Result<bool, ChannelError> {
        match self.receive("bool")? {
            Frame::Bool(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    fn receive_vector(&mut self, values: &mut [f64]) -> Result<(), ChannelError> {
        match self.receive("vector")? {
            Frame::Vector(v) => {
                if v.len() != values.len() {
                    return Err(ChannelError::SizeMismatch {
                        expected: values.len(),
                        found: v.len(),
                    });
                }
                values.copy_from_slice(&v);
                Ok(())
            }
            _ => unreachable!(),
        }
    }
}
