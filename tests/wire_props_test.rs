//! Property tests for the wire format: every encodable message survives a
//! round trip, and framing does not care where the byte stream is split.

use proptest::prelude::*;

use tui_tictactoe::protocol::{decode, encode, Action, FrameReader, Message};
use tui_tictactoe::types::{BoardState, Mark, Role};

fn role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::X), Just(Role::O)]
}

fn mark() -> impl Strategy<Value = Mark> {
    prop_oneof![Just(Mark::Empty), Just(Mark::X), Just(Mark::O)]
}

fn board() -> impl Strategy<Value = BoardState> {
    proptest::array::uniform9(mark()).prop_map(BoardState::from_cells)
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::InitialState),
        Just(Action::NewMove),
        Just(Action::NewBoard),
        role().prop_map(Action::Win),
        Just(Action::Draw),
        Just(Action::InvalidMove),
        Just(Action::Disconnect),
        Just(Action::RestartGame),
    ]
}

fn message() -> impl Strategy<Value = Message> {
    (action(), proptest::option::of(role()), proptest::option::of(board())).prop_map(
        |(action, role, board)| Message {
            action,
            role,
            board,
        },
    )
}

proptest! {
    #[test]
    fn prop_round_trip(msg in message()) {
        let frame = encode(&msg).unwrap();
        prop_assert_eq!(frame.last(), Some(&b'\n'));
        prop_assert_eq!(frame.iter().filter(|&&b| b == b'\n').count(), 1);
        prop_assert_eq!(decode(&frame).unwrap(), msg);
    }

    #[test]
    fn prop_split_anywhere_yields_same_frames(
        msgs in proptest::collection::vec(message(), 1..6),
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let stream: Vec<u8> = msgs.iter().flat_map(|m| encode(m).unwrap()).collect();

        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(stream.len() + 1)).collect();
        points.push(0);
        points.push(stream.len());
        points.sort_unstable();
        points.dedup();

        let mut reader = FrameReader::default();
        let mut decoded = Vec::new();
        for pair in points.windows(2) {
            for frame in reader.feed(&stream[pair[0]..pair[1]]).unwrap() {
                decoded.push(decode(&frame).unwrap());
            }
        }

        prop_assert_eq!(decoded, msgs);
        prop_assert_eq!(reader.buffered(), 0);
    }
}

#[test]
fn test_board_wire_shape() {
    let mut board = BoardState::new();
    board.set(4, Mark::X);
    let frame = encode(&Message::new_move(Role::X, board)).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&frame).unwrap();

    assert_eq!(value["action"], "new_move");
    assert_eq!(value["role"], "X");
    let cells = value["board"].as_object().unwrap();
    assert_eq!(cells.len(), 9);
    assert_eq!(cells["4"], "X");
    assert_eq!(cells["0"], "-");
}

fn sample_stream() -> (Vec<Message>, Vec<u8>) {
    let mut board = BoardState::new();
    board.set(0, Mark::X);
    board.set(4, Mark::O);
    let msgs = vec![
        Message::new(Action::InitialState).with_board(BoardState::new()),
        Message::new_move(Role::X, board),
        Message::new(Action::Win(Role::O)).with_role(Role::O).with_board(board),
        Message::new(Action::RestartGame),
    ];
    let stream = msgs.iter().flat_map(|m| encode(m).unwrap()).collect();
    (msgs, stream)
}

fn feed_all<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Vec<Message> {
    let mut reader = FrameReader::default();
    let mut decoded = Vec::new();
    for chunk in chunks {
        for frame in reader.feed(chunk).unwrap() {
            decoded.push(decode(&frame).unwrap());
        }
    }
    assert_eq!(reader.buffered(), 0);
    decoded
}

#[test]
fn test_one_byte_at_a_time() {
    let (msgs, stream) = sample_stream();
    assert_eq!(feed_all(stream.chunks(1)), msgs);
}

#[test]
fn test_every_single_split_point() {
    let (msgs, stream) = sample_stream();
    for i in 0..=stream.len() {
        let (head, tail) = stream.split_at(i);
        assert_eq!(feed_all([head, tail]), msgs, "split at {i}");
    }
}
