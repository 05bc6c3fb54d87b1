use proptest::prelude::*;
use sercon::{Broadcaster, Chunk, ScreenBuffer, ScreenEvent, ScrollRegion, Subscriber};

fn drain(subscriber: &mut Subscriber) -> Vec<Vec<u8>> {
    let mut seen = Vec::new();
    while let Some(chunk) = subscriber.try_get().unwrap() {
        seen.push(chunk.to_vec());
    }
    seen
}

proptest! {
    #[test]
    fn prop_subscribers_see_publish_order(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..32), 0..64),
        subscribers in 1usize..5,
    ) {
        let broadcaster = Broadcaster::new();
        let mut queues: Vec<Subscriber> =
            (0..subscribers).map(|_| broadcaster.subscribe("prop")).collect();

        for chunk in &chunks {
            broadcaster.publish(Chunk::copy_from_slice(chunk));
        }

        for queue in queues.iter_mut() {
            prop_assert_eq!(&drain(queue), &chunks);
        }
    }

    #[test]
    fn prop_late_subscriber_sees_only_later_chunks(
        before in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..8), 0..16),
        after in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..8), 0..16),
    ) {
        let broadcaster = Broadcaster::new();
        let mut early = broadcaster.subscribe("early");
        for chunk in &before {
            broadcaster.publish(Chunk::copy_from_slice(chunk));
        }
        let mut late = broadcaster.subscribe("late");
        for chunk in &after {
            broadcaster.publish(Chunk::copy_from_slice(chunk));
        }

        let everything: Vec<Vec<u8>> = before.iter().chain(after.iter()).cloned().collect();
        prop_assert_eq!(drain(&mut early), everything);
        prop_assert_eq!(drain(&mut late), after);
    }

    #[test]
    fn prop_wrap_scrolls_once_per_full_row(
        width in 1u16..40,
        text in prop::collection::vec(0x20u8..0x7f, 1..200),
    ) {
        let region = ScrollRegion { top: 0, bottom: 4, left: 1, width };
        let mut screen = ScreenBuffer::new(region, true);
        let events = screen.feed(&text);

        let scrolls = events.iter().filter(|e| **e == ScreenEvent::Scrolled).count();
        prop_assert_eq!(scrolls, (text.len() - 1) / usize::from(width));

        let cursor = screen.cursor();
        prop_assert!(cursor.column > region.left);
        prop_assert!(cursor.column <= region.end());
        prop_assert_eq!(cursor.row, region.bottom);
    }

    #[test]
    fn prop_committed_lines_match_newline_count(
        lines in prop::collection::vec("[a-z]{0,10}", 0..20),
    ) {
        let region = ScrollRegion { top: 0, bottom: 3, left: 1, width: 20 };
        let mut screen = ScreenBuffer::new(region, true);
        let mut bytes = Vec::new();
        for line in &lines {
            bytes.extend_from_slice(line.as_bytes());
            bytes.push(b'\n');
        }

        let committed: Vec<String> = screen
            .feed(&bytes)
            .into_iter()
            .filter_map(|e| match e {
                ScreenEvent::Committed(line) => Some(line),
                _ => None,
            })
            .collect();
        prop_assert_eq!(committed, lines);
    }
}
