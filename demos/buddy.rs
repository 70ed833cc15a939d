use std::io::Read;

use rbuddy::{BuddyAllocator, SbrkSource, program_break};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `gdb`,
/// or just watch the program break move as chunks are acquired.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    program_break(),
  );
}

fn print_heap(allocator: &BuddyAllocator<SbrkSource>) {
  let stats = allocator.stats();
  println!(
    "    chunks = {}, free blocks per class = {:?}, free = {} / {} bytes",
    stats.chunks,
    stats.free_blocks,
    stats.free_bytes(),
    stats.capacity(),
  );
}

fn main() {
  // RUST_LOG=rbuddy=trace shows every split and merge.
  env_logger::init();

  let mut allocator = BuddyAllocator::with_source(SbrkSource::new());

  print_program_break("start");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Allocate a u32. The first request pulls in a chunk and splits it
  //    all the way down to the smallest class that fits.
  // --------------------------------------------------------------------
  let first_block = allocator.allocate(size_of::<u32>());
  println!("\n[1] Allocate u32 -> {first_block:?}");
  print_program_break("1");
  print_heap(&allocator);

  let first_ptr = first_block as *mut u32;
  unsafe { first_ptr.write(0xDEADBEEF) };
  println!("[1] Value written = 0x{:X}", unsafe { first_ptr.read() });

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Allocate 100 bytes. Served from a larger free half left over by the
  //    first split; no new chunk.
  // --------------------------------------------------------------------
  let second_block = allocator.allocate(100);
  println!("\n[2] Allocate [u8; 100] -> {second_block:?}");
  unsafe { second_block.write_bytes(0xAB, 100) };
  print_heap(&allocator);

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Free the first block and allocate something of the same class.
  //    The freed block comes straight back.
  // --------------------------------------------------------------------
  unsafe { allocator.deallocate(first_block) };
  let third_block = allocator.allocate(2);
  println!(
    "\n[3] Freed first block, allocated [u8; 2] -> {third_block:?} (reused: {})",
    third_block == first_block
  );

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Ask for nearly a whole chunk. Nothing that large is free, so the
  //    program break moves.
  // --------------------------------------------------------------------
  print_program_break("before large alloc");
  let big_block = allocator.allocate(2000);
  println!("\n[4] Allocate [u8; 2000] -> {big_block:?}");
  print_program_break("after large alloc");
  print_heap(&allocator);

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Free everything: each chunk merges back into one free block.
  // --------------------------------------------------------------------
  unsafe {
    allocator.deallocate(third_block);
    allocator.deallocate(second_block);
    allocator.deallocate(big_block);
  }
  println!("\n[5] Freed everything");
  print_heap(&allocator);

  unsafe { allocator.deallocate(big_block) };
  println!("[5] Freeing the large block again: {}", allocator.last_error());

  // --------------------------------------------------------------------
  // 6) Dropping the allocator lowers the break again where it can.
  // --------------------------------------------------------------------
  drop(allocator);
  print_program_break("end");
}
