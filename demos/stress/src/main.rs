//! Stress test - many tasks through a small worker pool.
//!
//! Exercises the spawn/wait/reject admission paths under heavy submission
//! volume and reports throughput.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use wpool::{Pool, PoolOptions};

fn main() {
    println!("=== wpool Stress Test ===\n");

    let num_tasks: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(10_000);

    println!("Submitting {num_tasks} tasks...");

    let pool = Pool::new(8, PoolOptions::default()).expect("failed to build pool");
    let completed = Arc::new(AtomicU64::new(0));

    let start = Instant::now();

    for i in 0..num_tasks {
        let completed = completed.clone();
        pool.submit(Box::new(move || {
            completed.fetch_add(1, Ordering::Relaxed);
        }))
        .expect("submit should not fail under default options");

        if (i + 1) % 1000 == 0 {
            print!("\rSubmitted: {}/{}", i + 1, num_tasks);
        }
    }

    let submit_time = start.elapsed();
    println!("\n\nSubmit time: {submit_time:?}");
    println!(
        "Submit rate: {:.0} tasks/sec",
        num_tasks as f64 / submit_time.as_secs_f64()
    );

    println!("\nWaiting for completion...");
    let run_start = Instant::now();

    loop {
        let done = completed.load(Ordering::Relaxed) as usize;
        if done >= num_tasks {
            break;
        }
        if run_start.elapsed().as_secs() > 30 {
            println!("Timeout! Only {done}/{num_tasks} completed");
            break;
        }
        print!("\rCompleted: {done}/{num_tasks}");
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    let total_time = start.elapsed();
    let run_time = run_start.elapsed();

    println!("\n\n=== Results ===");
    println!("Total tasks:  {num_tasks}");
    println!("Completed:    {}", completed.load(Ordering::Relaxed));
    println!("Submit time:  {submit_time:?}");
    println!("Run time:     {run_time:?}");
    println!("Total time:   {total_time:?}");
    println!(
        "Throughput:   {:.0} tasks/sec",
        num_tasks as f64 / total_time.as_secs_f64()
    );

    pool.release();
    println!("\n=== Stress Test Complete ===");
}
