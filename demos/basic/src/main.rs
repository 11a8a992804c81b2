//! Basic wpool example
//!
//! Demonstrates submitting tasks and waiting for them to finish.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wpool::{Pool, PoolOptions};

fn main() {
    println!("=== wpool Basic Example ===\n");

    let pool = Pool::new(4, PoolOptions::default()).expect("failed to build pool");

    let completed = Arc::new(AtomicUsize::new(0));
    let total_tasks = 3;

    println!("Submitting tasks...\n");

    let c1 = completed.clone();
    pool.submit(Box::new(move || {
        println!("[task 1] started");
        for i in 0..3 {
            println!("[task 1] iteration {i}");
        }
        println!("[task 1] finished");
        c1.fetch_add(1, Ordering::SeqCst);
    }))
    .expect("submit 1");

    let c2 = completed.clone();
    pool.submit(Box::new(move || {
        println!("[task 2] started");
        for i in 0..3 {
            println!("[task 2] iteration {i}");
        }
        println!("[task 2] finished");
        c2.fetch_add(1, Ordering::SeqCst);
    }))
    .expect("submit 2");

    let c3 = completed.clone();
    pool.submit(Box::new(move || {
        println!("[task 3] started");
        println!("[task 3] finished");
        c3.fetch_add(1, Ordering::SeqCst);
    }))
    .expect("submit 3");

    println!("\nWaiting for tasks to complete...");
    let start = std::time::Instant::now();
    let timeout = Duration::from_secs(5);

    while completed.load(Ordering::SeqCst) < total_tasks {
        if start.elapsed() > timeout {
            println!("WARNING: timeout waiting for tasks!");
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    println!("\n{}/{} tasks completed!", completed.load(Ordering::SeqCst), total_tasks);

    pool.release();
    println!("\n=== Example Complete ===");
}
