//! # Kernel synchronization primitives
//!
//! The page allocator's entry points mutate free lists and page metadata
//! non-atomically. Callers that share one allocator between contexts wrap it
//! in a [`SpinLock`] and hold the guard for the whole allocate or free
//! sequence.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod spin_lock;

pub use spin_lock::{SpinLock, SpinLockGuard};
