#[macro_export]
macro_rules! pack_unpack_inverse_test {
    ($($name:ident, $thing:expr)*) => {
    $(
        #[test]
        fn $name() {
            let mut thing = $thing;
            let i = thing.pack();
            let _ = thing.unpack(&mut i.clone()).expect("unpacking thing failed");
            let j = thing.pack();
            assert_eq!(i, j);
        }
    )*
    }
}
