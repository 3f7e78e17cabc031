use rusty_selection::prelude::*;

pub fn main() {
    let mut rng = rand::thread_rng();
    let mat = f64::random_low_rank_matrix((200, 50), 10, &mut rng);

    // Pick the ten features that best span the data.
    let mut cur = GreedySelector::new(
        CUR::<f64>::new(SelectionAxis::COLUMNS).with_k(2),
        TargetSize::COUNT(10),
    );
    cur.fit(mat.view(), None, false).unwrap();
    println!("CUR features: {:?}", cur.selected_indices().unwrap());

    // Pick the ten features that best cover the data geometrically.
    let mut fps = GreedySelector::new(
        FPS::<f64>::new(SelectionAxis::COLUMNS).with_start(FPSStart::RANDOM),
        TargetSize::COUNT(10),
    );
    fps.fit(mat.view(), None, false).unwrap();
    println!("FPS features: {:?}", fps.selected_indices().unwrap());

    // Extend the farthest point search to twenty features without
    // restarting from scratch.
    fps.set_target(TargetSize::COUNT(20));
    fps.fit(mat.view(), None, true).unwrap();
    println!("Extended FPS features: {:?}", fps.selected_indices().unwrap());

    println!("Success.")
}
