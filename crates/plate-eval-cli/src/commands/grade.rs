//! Grade command.

use plate_eval::grade;

pub fn run(accuracy: f64, time_per_100: f64) {
    println!("Accuracy:        {:.2}%", accuracy);
    println!("Time (per 100):  {:.2}s", time_per_100);
    println!("Grade:           {:.1}", grade(accuracy, time_per_100));
}
